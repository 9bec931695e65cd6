use cdmirror_config::Config;
use cdmirror_materialize::error::ErrorKind;
use cdmirror_materialize::{ChainEvent, ChainInput, Materializer, Outcome};
use cdmirror_schema::wire::{
    InputPropertyValue, InputValue, OperationRecord, ParameterizedEntity, ParametrizedClassPropertyValue,
    ParametrizedPropertyValue,
};
use cdmirror_schema::{DomainClass, EntityId};
use cdmirror_store::models::{
    Category, Channel, ClassEntity, Cursor, FeaturedVideo, HttpMediaLocation, JoystreamMediaLocation, KnownLicense,
    Language, License, LicenseKind, LicenseTarget, MediaLocation, MediaLocationKind, UserDefinedLicense, Video,
    VideoMedia, VideoMediaEncoding,
};
use cdmirror_store::{Database, Record};
use rstest::rstest;

// =========================================================================
// Helpers
// =========================================================================

async fn mirror_with(config: Config) -> Materializer {
    let db = Database::connect_in_memory().await.unwrap();
    let mirror = Materializer::new(db, &config);
    mirror.bootstrap(1).await.unwrap();
    mirror
}

async fn mirror() -> Materializer {
    mirror_with(Config::default()).await
}

async fn find<R: Record>(mirror: &Materializer, id: EntityId) -> Option<R> {
    let mut conn = mirror.database().pool().acquire().await.unwrap();
    R::find(&mut conn, id).await.unwrap()
}

async fn class_entity(mirror: &Materializer, id: EntityId) -> Option<ClassEntity> {
    let mut conn = mirror.database().pool().acquire().await.unwrap();
    ClassEntity::find(&mut conn, id).await.unwrap()
}

async fn save<R: Record>(mirror: &Materializer, record: &R) {
    let mut conn = mirror.database().pool().acquire().await.unwrap();
    record.save(&mut conn).await.unwrap();
}

async fn next_id(mirror: &Materializer) -> EntityId {
    mirror.status().await.unwrap().next_entity_id
}

fn single(slot: u16, value: InputValue) -> ParametrizedClassPropertyValue {
    ParametrizedClassPropertyValue {
        in_class_index: slot,
        value: ParametrizedPropertyValue::InputPropertyValue(InputPropertyValue::Single(value)),
    }
}

fn text(slot: u16, value: &str) -> ParametrizedClassPropertyValue {
    single(slot, InputValue::Text(value.to_string()))
}

fn existing(slot: u16, id: EntityId) -> ParametrizedClassPropertyValue {
    single(slot, InputValue::Reference(id))
}

fn local(slot: u16, index: u32) -> ParametrizedClassPropertyValue {
    ParametrizedClassPropertyValue {
        in_class_index: slot,
        value: ParametrizedPropertyValue::InternalEntityJustAdded(index),
    }
}

fn create(class: DomainClass) -> OperationRecord {
    OperationRecord::CreateEntity { class_id: class.class_id() }
}

fn schema(index: u32, values: Vec<ParametrizedClassPropertyValue>) -> OperationRecord {
    OperationRecord::AddSchemaSupportToEntity {
        entity: ParameterizedEntity::InternalEntityJustAdded(index),
        schema_id: 0,
        parametrized_property_values: values,
    }
}

fn update(id: EntityId, values: Vec<ParametrizedClassPropertyValue>) -> OperationRecord {
    OperationRecord::UpdatePropertyValues {
        entity: ParameterizedEntity::ExistingEntity(id),
        new_parametrized_property_values: values,
    }
}

fn transaction(block: u32, index: u32, operations: Vec<OperationRecord>) -> ChainInput {
    ChainInput::new(block, index, ChainEvent::Transaction { operations, failed_at: None })
}

fn removed(block: u32, entity_id: EntityId) -> ChainInput {
    ChainInput::new(block, 0, ChainEvent::EntityRemoved { entity_id })
}

// Slot numbers, in class order.
const CATEGORY_NAME: u16 = 0;
const CHANNEL_TITLE: u16 = 0;
const CHANNEL_DESCRIPTION: u16 = 1;
const CHANNEL_LANGUAGE: u16 = 6;
const LANGUAGE_NAME: u16 = 0;
const LANGUAGE_CODE: u16 = 1;
const KNOWN_LICENSE_CODE: u16 = 0;
const LICENSE_KNOWN: u16 = 0;
const VIDEO_CHANNEL: u16 = 0;
const VIDEO_CATEGORY: u16 = 1;
const VIDEO_TITLE: u16 = 2;
const VIDEO_LANGUAGE: u16 = 7;
const VIDEO_MEDIA: u16 = 8;
const VIDEO_LICENSE: u16 = 14;
const FEATURED_VIDEO: u16 = 0;
const USER_DEFINED_CONTENT: u16 = 0;
const LICENSE_USER_DEFINED: u16 = 1;
const HTTP_URL: u16 = 0;
const JOYSTREAM_DATA_OBJECT: u16 = 0;
const LOCATION_HTTP: u16 = 0;
const LOCATION_JOYSTREAM: u16 = 1;
const ENCODING_NAME: u16 = 0;
const MEDIA_ENCODING: u16 = 0;
const MEDIA_PIXEL_WIDTH: u16 = 1;
const MEDIA_LOCATION: u16 = 4;

// =========================================================================
// Batches
// =========================================================================

#[tokio::test]
async fn test_category_and_video_in_one_batch() {
    let mirror = mirror().await;
    let before = next_id(&mirror).await;
    let input = transaction(2, 0, vec![
        create(DomainClass::ContentCategory),
        create(DomainClass::Video),
        schema(1, vec![
            text(VIDEO_TITLE, "t"),
            local(VIDEO_CATEGORY, 0),
            existing(VIDEO_CHANNEL, 0),
            existing(VIDEO_MEDIA, 0),
            existing(VIDEO_LICENSE, 0),
        ]),
        schema(0, vec![text(CATEGORY_NAME, "Music")]),
    ]);
    assert_eq!(mirror.apply(&input).await.unwrap(), Outcome::Applied);

    let category: Category = find(&mirror, before).await.unwrap();
    assert_eq!(category.name, "Music");
    let video: Video = find(&mirror, before + 1).await.unwrap();
    assert_eq!(video.title, "t");
    assert_eq!(video.category, before);
    assert_eq!(video.channel, 0);
    assert_eq!(video.version, 2);
    assert!(!video.is_featured);
    let template: KnownLicense = find(&mirror, 0).await.unwrap();
    assert_eq!(video.license, LicenseKind::from(&template));
    assert_eq!(next_id(&mirror).await, before + 2);
    assert_eq!(class_entity(&mirror, before + 1).await.unwrap().class_id, DomainClass::Video.class_id());
}

#[tokio::test]
async fn test_reference_to_entity_declared_later() {
    let mirror = mirror().await;
    let before = next_id(&mirror).await;
    let input = transaction(2, 0, vec![
        create(DomainClass::Channel),
        schema(0, vec![text(CHANNEL_TITLE, "Kanal"), local(CHANNEL_LANGUAGE, 1)]),
        create(DomainClass::Language),
        schema(1, vec![text(LANGUAGE_NAME, "Deutsch"), text(LANGUAGE_CODE, "de")]),
    ]);
    mirror.apply(&input).await.unwrap();

    let channel: Channel = find(&mirror, before).await.unwrap();
    assert_eq!(channel.language, Some(before + 1));
    let language: Language = find(&mirror, before + 1).await.unwrap();
    assert_eq!(language.code, "de");
}

#[tokio::test]
async fn test_update_applies_to_row_built_in_same_batch() {
    let mirror = mirror().await;
    let before = next_id(&mirror).await;
    mirror.apply(&transaction(2, 0, vec![create(DomainClass::ContentCategory)])).await.unwrap();
    // Schema support and an update for the same entity, update first.
    let input = transaction(3, 0, vec![
        update(before, vec![text(CATEGORY_NAME, "Renamed")]),
        OperationRecord::AddSchemaSupportToEntity {
            entity: ParameterizedEntity::ExistingEntity(before),
            schema_id: 0,
            parametrized_property_values: vec![text(CATEGORY_NAME, "Original")],
        },
    ]);
    mirror.apply(&input).await.unwrap();
    let category: Category = find(&mirror, before).await.unwrap();
    assert_eq!(category.name, "Renamed");
}

#[tokio::test]
async fn test_watermark_advances_by_creation_count() {
    let mirror = mirror().await;
    let before = next_id(&mirror).await;
    let batches = [
        transaction(2, 0, vec![create(DomainClass::Language), create(DomainClass::ContentCategory)]),
        transaction(2, 1, vec![]),
        transaction(3, 0, vec![create(DomainClass::Video); 3]),
    ];
    for batch in &batches {
        mirror.apply(batch).await.unwrap();
    }
    assert_eq!(next_id(&mirror).await, before + 5);

    // Replaying the tail of the stream changes nothing.
    for batch in &batches[1..] {
        assert_eq!(mirror.apply(batch).await.unwrap(), Outcome::Skipped);
    }
    assert_eq!(next_id(&mirror).await, before + 5);
    assert_eq!(mirror.status().await.unwrap().cursor, Some(Cursor { block: 3, position: 0 }));
}

#[tokio::test]
async fn test_failed_transaction_applies_prefix_only() {
    let mirror = mirror().await;
    let before = next_id(&mirror).await;
    let input = ChainInput::new(2, 0, ChainEvent::Transaction {
        operations: vec![
            create(DomainClass::ContentCategory),
            schema(0, vec![text(CATEGORY_NAME, "Kept")]),
            create(DomainClass::ContentCategory),
            schema(1, vec![text(CATEGORY_NAME, "Rejected")]),
        ],
        failed_at: Some(2),
    });
    mirror.apply(&input).await.unwrap();
    assert_eq!(next_id(&mirror).await, before + 1);
    assert_eq!(find::<Category>(&mirror, before).await.unwrap().name, "Kept");
    assert!(class_entity(&mirror, before + 1).await.is_none());
}

#[tokio::test]
async fn test_unknown_class_is_skipped() {
    let mirror = mirror().await;
    let before = next_id(&mirror).await;
    let input = transaction(2, 0, vec![
        OperationRecord::CreateEntity { class_id: 99 },
        schema(0, vec![text(0, "whatever")]),
        create(DomainClass::ContentCategory),
        schema(1, vec![text(CATEGORY_NAME, "Known")]),
    ]);
    assert_eq!(mirror.apply(&input).await.unwrap(), Outcome::Applied);
    assert_eq!(next_id(&mirror).await, before + 2);
    assert_eq!(class_entity(&mirror, before).await.unwrap().class_id, 99);
    assert_eq!(find::<Category>(&mirror, before + 1).await.unwrap().name, "Known");
}

#[rstest]
#[case::missing_existing_reference(
    vec![create(DomainClass::Video), schema(0, vec![existing(VIDEO_CHANNEL, 999)])],
)]
#[case::local_index_out_of_range(
    vec![create(DomainClass::Video), schema(0, vec![local(VIDEO_CATEGORY, 5)])],
)]
#[case::local_reference_of_wrong_class(
    vec![
        create(DomainClass::Channel),
        create(DomainClass::Video),
        schema(0, vec![text(CHANNEL_TITLE, "c")]),
        schema(1, vec![local(VIDEO_CATEGORY, 0)]),
    ],
)]
#[case::local_reference_without_schema(
    vec![create(DomainClass::ContentCategory), create(DomainClass::Video), schema(1, vec![local(VIDEO_CATEGORY, 0)])],
)]
#[tokio::test]
async fn test_integrity_errors_roll_back(#[case] operations: Vec<OperationRecord>) {
    let mirror = mirror().await;
    let before = mirror.status().await.unwrap();
    let err = mirror.apply(&transaction(2, 0, operations)).await.unwrap_err();
    assert!(
        matches!(
            &*err,
            ErrorKind::EntityNotFound { .. } | ErrorKind::UnknownLocalEntity(_) | ErrorKind::ClassMismatch { .. }
        ),
        "{err:?}"
    );
    assert_eq!(mirror.status().await.unwrap(), before);
    assert!(class_entity(&mirror, before.next_entity_id).await.is_none());
}

#[tokio::test]
async fn test_unsupported_value_is_a_decode_error() {
    let mirror = mirror().await;
    let operations = vec![
        create(DomainClass::ContentCategory),
        schema(0, vec![single(CATEGORY_NAME, InputValue::TextToHash("x".into()))]),
    ];
    let err = mirror.apply(&transaction(2, 0, operations)).await.unwrap_err();
    assert!(matches!(&*err, ErrorKind::Decode));
}

#[tokio::test]
async fn test_missing_template_is_fatal() {
    let db = Database::connect_in_memory().await.unwrap();
    let mirror = Materializer::new(db, &Config::default());
    let input = transaction(2, 0, vec![create(DomainClass::ContentCategory), schema(0, vec![])]);
    let err = mirror.apply(&input).await.unwrap_err();
    assert!(matches!(&*err, ErrorKind::TemplateMissing("ContentCategory")));
}

// =========================================================================
// Templates
// =========================================================================

#[tokio::test]
async fn test_bootstrap_is_idempotent() {
    let db = Database::connect_in_memory().await.unwrap();
    let mirror = Materializer::new(db, &Config::default());
    assert_eq!(mirror.bootstrap(1).await.unwrap(), DomainClass::ALL.len());
    assert_eq!(mirror.bootstrap(1).await.unwrap(), 0);
    let featured: FeaturedVideo = find(&mirror, 0).await.unwrap();
    assert_eq!(featured.video, 0);
    // Templates carry no class entity, so they cannot be removed by id.
    assert!(class_entity(&mirror, 0).await.is_none());
}

#[tokio::test]
async fn test_creation_inherits_current_template_values() {
    let mut config = Config::default();
    config.templates.channel.is_public = false;
    let mirror = mirror_with(config).await;
    let mut template: Channel = find(&mirror, 0).await.unwrap();
    assert!(!template.is_public);
    template.is_curated = true;
    save(&mirror, &template).await;

    let before = next_id(&mirror).await;
    let input = transaction(2, 0, vec![
        create(DomainClass::Channel),
        schema(0, vec![text(CHANNEL_TITLE, "News"), text(CHANNEL_DESCRIPTION, "Daily")]),
    ]);
    mirror.apply(&input).await.unwrap();
    let channel: Channel = find(&mirror, before).await.unwrap();
    assert_eq!(channel.title, "News");
    assert_eq!(channel.description, "Daily");
    assert!(!channel.is_public);
    assert!(channel.is_curated);
    assert_eq!(channel.language, None);
}

// =========================================================================
// Standalone events
// =========================================================================

#[tokio::test]
async fn test_standalone_create_is_idempotent() {
    let mirror = mirror().await;
    let class_id = DomainClass::ContentCategory.class_id();
    mirror.apply(&ChainInput::new(2, 0, ChainEvent::EntityCreated { class_id, entity_id: 50 })).await.unwrap();
    assert_eq!(next_id(&mirror).await, 51);

    for (index, name) in [(1, "First"), (2, "Second")] {
        let event = ChainEvent::EntitySchemaSupportAdded {
            entity_id: 50,
            schema_id: 0,
            properties: vec![text(CATEGORY_NAME, name)],
        };
        mirror.apply(&ChainInput::new(2, index, event)).await.unwrap();
    }
    let category: Category = find(&mirror, 50).await.unwrap();
    assert_eq!(category.name, "First");

    let properties = vec![text(CATEGORY_NAME, "Third")];
    let event = ChainEvent::EntityPropertyValuesUpdated { entity_id: 50, properties };
    mirror.apply(&ChainInput::new(2, 3, event)).await.unwrap();
    assert_eq!(find::<Category>(&mirror, 50).await.unwrap().name, "Third");
}

#[tokio::test]
async fn test_entity_created_never_lowers_watermark() {
    let mirror = mirror().await;
    let class_id = DomainClass::Language.class_id();
    mirror.apply(&ChainInput::new(2, 0, ChainEvent::EntityCreated { class_id, entity_id: 20 })).await.unwrap();
    mirror.apply(&ChainInput::new(2, 1, ChainEvent::EntityCreated { class_id, entity_id: 5 })).await.unwrap();
    assert_eq!(next_id(&mirror).await, 21);
}

#[tokio::test]
async fn test_removing_unknown_entity_is_skipped() {
    let mirror = mirror().await;
    assert_eq!(mirror.apply(&removed(2, 12345)).await.unwrap(), Outcome::Applied);
}

#[tokio::test]
async fn test_removing_entity_without_schema_drops_class_entity() {
    let mirror = mirror().await;
    let before = next_id(&mirror).await;
    mirror.apply(&transaction(2, 0, vec![create(DomainClass::Video)])).await.unwrap();
    assert!(class_entity(&mirror, before).await.is_some());
    mirror.apply(&removed(3, before)).await.unwrap();
    assert!(class_entity(&mirror, before).await.is_none());
}

// =========================================================================
// Cascades
// =========================================================================

#[tokio::test]
async fn test_removing_category_removes_its_videos() {
    let mirror = mirror().await;
    let w = next_id(&mirror).await;
    let input = transaction(2, 0, vec![
        create(DomainClass::ContentCategory),
        create(DomainClass::ContentCategory),
        create(DomainClass::Video),
        create(DomainClass::Video),
        create(DomainClass::Video),
        schema(0, vec![text(CATEGORY_NAME, "Doomed")]),
        schema(1, vec![text(CATEGORY_NAME, "Safe")]),
        schema(2, vec![local(VIDEO_CATEGORY, 0)]),
        schema(3, vec![local(VIDEO_CATEGORY, 0)]),
        schema(4, vec![local(VIDEO_CATEGORY, 1)]),
    ]);
    mirror.apply(&input).await.unwrap();
    mirror.apply(&removed(3, w)).await.unwrap();

    assert!(find::<Category>(&mirror, w).await.is_none());
    for id in [w, w + 2, w + 3] {
        assert!(class_entity(&mirror, id).await.is_none(), "class entity {id} survived");
    }
    assert!(find::<Video>(&mirror, w + 2).await.is_none());
    assert!(find::<Video>(&mirror, w + 3).await.is_none());
    assert_eq!(find::<Video>(&mirror, w + 4).await.unwrap().category, w + 1);
    assert!(find::<Video>(&mirror, 0).await.is_some());
}

#[tokio::test]
async fn test_removing_known_license_removes_matching_videos() {
    let mirror = mirror().await;
    let w = next_id(&mirror).await;
    let input = transaction(2, 0, vec![
        create(DomainClass::KnownLicense),
        create(DomainClass::License),
        create(DomainClass::Video),
        create(DomainClass::Video),
        create(DomainClass::Video),
        schema(2, vec![text(VIDEO_TITLE, "a"), local(VIDEO_LICENSE, 1)]),
        schema(3, vec![text(VIDEO_TITLE, "b"), local(VIDEO_LICENSE, 1)]),
        schema(4, vec![text(VIDEO_TITLE, "template licensed")]),
        schema(1, vec![local(LICENSE_KNOWN, 0)]),
        schema(0, vec![text(KNOWN_LICENSE_CODE, "CC0")]),
    ]);
    mirror.apply(&input).await.unwrap();
    let video: Video = find(&mirror, w + 2).await.unwrap();
    assert!(matches!(&video.license, LicenseKind::Known { code, .. } if code == "CC0"));
    let license: License = find(&mirror, w + 1).await.unwrap();
    assert_eq!(license.target, LicenseTarget::Known(w));

    mirror.apply(&removed(3, w)).await.unwrap();
    assert!(find::<KnownLicense>(&mirror, w).await.is_none());
    assert!(find::<License>(&mirror, w + 1).await.is_none());
    assert!(find::<Video>(&mirror, w + 2).await.is_none());
    assert!(find::<Video>(&mirror, w + 3).await.is_none());
    assert_eq!(find::<Video>(&mirror, w + 4).await.unwrap().title, "template licensed");
    assert!(class_entity(&mirror, w + 1).await.is_none());
}

#[tokio::test]
async fn test_removing_language_detaches_instead_of_deleting() {
    let mirror = mirror().await;
    let w = next_id(&mirror).await;
    let input = transaction(2, 0, vec![
        create(DomainClass::Language),
        create(DomainClass::Channel),
        create(DomainClass::Video),
        schema(0, vec![text(LANGUAGE_CODE, "fr")]),
        schema(1, vec![local(CHANNEL_LANGUAGE, 0)]),
        schema(2, vec![local(VIDEO_LANGUAGE, 0), local(VIDEO_CHANNEL, 1)]),
    ]);
    mirror.apply(&input).await.unwrap();
    mirror.apply(&removed(3, w)).await.unwrap();

    assert!(find::<Language>(&mirror, w).await.is_none());
    assert_eq!(find::<Channel>(&mirror, w + 1).await.unwrap().language, None);
    let video: Video = find(&mirror, w + 2).await.unwrap();
    assert_eq!(video.language, None);
    assert_eq!(video.channel, w + 1);
}

#[tokio::test]
async fn test_featured_video_moves_flag() {
    let mirror = mirror().await;
    let w = next_id(&mirror).await;
    let input = transaction(2, 0, vec![
        create(DomainClass::Video),
        create(DomainClass::Video),
        create(DomainClass::FeaturedVideo),
        schema(2, vec![local(FEATURED_VIDEO, 0)]),
        schema(0, vec![text(VIDEO_TITLE, "first")]),
        schema(1, vec![text(VIDEO_TITLE, "second")]),
    ]);
    mirror.apply(&input).await.unwrap();
    assert!(find::<Video>(&mirror, w).await.unwrap().is_featured);
    assert!(!find::<Video>(&mirror, w + 1).await.unwrap().is_featured);

    mirror.apply(&transaction(3, 0, vec![update(w + 2, vec![existing(FEATURED_VIDEO, w + 1)])])).await.unwrap();
    assert!(!find::<Video>(&mirror, w).await.unwrap().is_featured);
    assert!(find::<Video>(&mirror, w + 1).await.unwrap().is_featured);

    mirror.apply(&removed(4, w + 2)).await.unwrap();
    assert!(!find::<Video>(&mirror, w + 1).await.unwrap().is_featured);
    assert!(find::<FeaturedVideo>(&mirror, w + 2).await.is_none());
}

#[tokio::test]
async fn test_removing_featured_video_drops_featured_entry() {
    let mirror = mirror().await;
    let w = next_id(&mirror).await;
    let input = transaction(2, 0, vec![
        create(DomainClass::Video),
        create(DomainClass::FeaturedVideo),
        schema(0, vec![text(VIDEO_TITLE, "star")]),
        schema(1, vec![local(FEATURED_VIDEO, 0)]),
    ]);
    mirror.apply(&input).await.unwrap();
    mirror.apply(&removed(3, w)).await.unwrap();

    assert!(find::<Video>(&mirror, w).await.is_none());
    assert!(find::<FeaturedVideo>(&mirror, w + 1).await.is_none());
    assert!(class_entity(&mirror, w + 1).await.is_none());
}

#[tokio::test]
async fn test_featured_entry_without_video_leaves_template_unflagged() {
    let mirror = mirror().await;
    let w = next_id(&mirror).await;
    mirror.apply(&transaction(2, 0, vec![create(DomainClass::FeaturedVideo), schema(0, vec![])])).await.unwrap();

    assert_eq!(find::<FeaturedVideo>(&mirror, w).await.unwrap().video, 0);
    assert!(!find::<Video>(&mirror, 0).await.unwrap().is_featured);

    mirror.apply(&removed(3, w)).await.unwrap();
    assert!(find::<FeaturedVideo>(&mirror, w).await.is_none());
    assert!(find::<Video>(&mirror, 0).await.is_some());
}

#[tokio::test]
async fn test_video_stays_featured_while_any_entry_points_at_it() {
    let mirror = mirror().await;
    let w = next_id(&mirror).await;
    let input = transaction(2, 0, vec![
        create(DomainClass::Video),
        create(DomainClass::Video),
        create(DomainClass::FeaturedVideo),
        create(DomainClass::FeaturedVideo),
        schema(0, vec![text(VIDEO_TITLE, "shared")]),
        schema(1, vec![text(VIDEO_TITLE, "other")]),
        schema(2, vec![local(FEATURED_VIDEO, 0)]),
        schema(3, vec![local(FEATURED_VIDEO, 0)]),
    ]);
    mirror.apply(&input).await.unwrap();
    assert!(find::<Video>(&mirror, w).await.unwrap().is_featured);

    // Moving one entry away keeps the flag for the entry left behind.
    mirror.apply(&transaction(3, 0, vec![update(w + 2, vec![existing(FEATURED_VIDEO, w + 1)])])).await.unwrap();
    assert!(find::<Video>(&mirror, w).await.unwrap().is_featured);
    assert!(find::<Video>(&mirror, w + 1).await.unwrap().is_featured);

    mirror.apply(&removed(4, w + 3)).await.unwrap();
    assert!(!find::<Video>(&mirror, w).await.unwrap().is_featured);
    assert!(find::<Video>(&mirror, w + 1).await.unwrap().is_featured);

    // Both entries on the same video: removing one keeps the flag.
    let input = transaction(5, 0, vec![
        create(DomainClass::FeaturedVideo),
        schema(0, vec![existing(FEATURED_VIDEO, w + 1)]),
    ]);
    mirror.apply(&input).await.unwrap();
    mirror.apply(&removed(6, w + 2)).await.unwrap();
    assert!(find::<FeaturedVideo>(&mirror, w + 4).await.is_some());
    assert!(find::<Video>(&mirror, w + 1).await.unwrap().is_featured);
}

#[tokio::test]
async fn test_entity_created_past_store_range_is_rejected() {
    let mirror = mirror().await;
    let before = mirror.status().await.unwrap();
    let class_id = DomainClass::Language.class_id();
    let input = ChainInput::new(2, 0, ChainEvent::EntityCreated { class_id, entity_id: u64::MAX });
    let err = mirror.apply(&input).await.unwrap_err();
    assert!(matches!(&*err, ErrorKind::Store));
    assert_eq!(mirror.status().await.unwrap(), before);
}

// =========================================================================
// Cascades, one per removed class
// =========================================================================

#[tokio::test]
async fn test_removing_channel_removes_its_videos() {
    let mirror = mirror().await;
    let w = next_id(&mirror).await;
    let input = transaction(2, 0, vec![
        create(DomainClass::Channel),
        create(DomainClass::Video),
        create(DomainClass::Video),
        create(DomainClass::Video),
        schema(0, vec![text(CHANNEL_TITLE, "Doomed")]),
        schema(1, vec![local(VIDEO_CHANNEL, 0)]),
        schema(2, vec![local(VIDEO_CHANNEL, 0)]),
        schema(3, vec![text(VIDEO_TITLE, "template channel")]),
    ]);
    mirror.apply(&input).await.unwrap();
    mirror.apply(&removed(3, w)).await.unwrap();

    assert!(find::<Channel>(&mirror, w).await.is_none());
    for id in [w, w + 1, w + 2] {
        assert!(class_entity(&mirror, id).await.is_none(), "class entity {id} survived");
    }
    assert!(find::<Video>(&mirror, w + 1).await.is_none());
    assert!(find::<Video>(&mirror, w + 2).await.is_none());
    assert_eq!(find::<Video>(&mirror, w + 3).await.unwrap().channel, 0);
    assert!(find::<Channel>(&mirror, 0).await.is_some());
    assert!(find::<Video>(&mirror, 0).await.is_some());
}

#[tokio::test]
async fn test_removing_user_defined_license_removes_matching_videos() {
    let mirror = mirror().await;
    let w = next_id(&mirror).await;
    let input = transaction(2, 0, vec![
        create(DomainClass::UserDefinedLicense),
        create(DomainClass::License),
        create(DomainClass::Video),
        create(DomainClass::Video),
        schema(0, vec![text(USER_DEFINED_CONTENT, "do as you please")]),
        schema(1, vec![local(LICENSE_USER_DEFINED, 0)]),
        schema(2, vec![local(VIDEO_LICENSE, 1)]),
        schema(3, vec![text(VIDEO_TITLE, "template licensed")]),
    ]);
    mirror.apply(&input).await.unwrap();
    let video: Video = find(&mirror, w + 2).await.unwrap();
    assert_eq!(video.license, LicenseKind::UserDefined { content: "do as you please".to_string() });

    mirror.apply(&removed(3, w)).await.unwrap();
    assert!(find::<UserDefinedLicense>(&mirror, w).await.is_none());
    assert!(find::<License>(&mirror, w + 1).await.is_none());
    assert!(find::<Video>(&mirror, w + 2).await.is_none());
    assert!(class_entity(&mirror, w + 2).await.is_none());
    assert!(find::<Video>(&mirror, w + 3).await.is_some());
    assert!(find::<UserDefinedLicense>(&mirror, 0).await.is_some());
    assert!(find::<License>(&mirror, 0).await.is_some());
    assert!(find::<Video>(&mirror, 0).await.is_some());
}

#[tokio::test]
async fn test_removing_license_removes_matching_videos_only() {
    let mirror = mirror().await;
    let w = next_id(&mirror).await;
    let input = transaction(2, 0, vec![
        create(DomainClass::KnownLicense),
        create(DomainClass::License),
        create(DomainClass::Video),
        create(DomainClass::Video),
        schema(0, vec![text(KNOWN_LICENSE_CODE, "MIT")]),
        schema(1, vec![local(LICENSE_KNOWN, 0)]),
        schema(2, vec![local(VIDEO_LICENSE, 1)]),
        schema(3, vec![text(VIDEO_TITLE, "template licensed")]),
    ]);
    mirror.apply(&input).await.unwrap();
    mirror.apply(&removed(3, w + 1)).await.unwrap();

    assert!(find::<License>(&mirror, w + 1).await.is_none());
    assert!(find::<Video>(&mirror, w + 2).await.is_none());
    assert!(class_entity(&mirror, w + 2).await.is_none());
    // The license's target and unrelated videos are left alone.
    assert_eq!(find::<KnownLicense>(&mirror, w).await.unwrap().code, "MIT");
    assert!(find::<Video>(&mirror, w + 3).await.is_some());
    assert!(find::<License>(&mirror, 0).await.is_some());
    assert!(find::<Video>(&mirror, 0).await.is_some());
}

#[tokio::test]
async fn test_removing_http_location_removes_dependent_media_chain() {
    let mirror = mirror().await;
    let w = next_id(&mirror).await;
    let input = transaction(2, 0, vec![
        create(DomainClass::HttpMediaLocation),
        create(DomainClass::MediaLocation),
        create(DomainClass::VideoMedia),
        create(DomainClass::Video),
        create(DomainClass::Video),
        schema(0, vec![text(HTTP_URL, "https://cdn.example")]),
        schema(1, vec![local(LOCATION_HTTP, 0)]),
        schema(2, vec![local(MEDIA_LOCATION, 1)]),
        schema(3, vec![local(VIDEO_MEDIA, 2)]),
        schema(4, vec![text(VIDEO_TITLE, "template media")]),
    ]);
    mirror.apply(&input).await.unwrap();
    let media: VideoMedia = find(&mirror, w + 2).await.unwrap();
    assert!(matches!(&media.location, MediaLocationKind::Http { url, .. } if url == "https://cdn.example"));

    mirror.apply(&removed(3, w)).await.unwrap();
    assert!(find::<HttpMediaLocation>(&mirror, w).await.is_none());
    assert!(find::<MediaLocation>(&mirror, w + 1).await.is_none());
    assert!(find::<VideoMedia>(&mirror, w + 2).await.is_none());
    assert!(find::<Video>(&mirror, w + 3).await.is_none());
    for id in [w, w + 1, w + 2, w + 3] {
        assert!(class_entity(&mirror, id).await.is_none(), "class entity {id} survived");
    }
    assert_eq!(find::<Video>(&mirror, w + 4).await.unwrap().media, 0);
    assert!(find::<HttpMediaLocation>(&mirror, 0).await.is_some());
    assert!(find::<MediaLocation>(&mirror, 0).await.is_some());
    assert!(find::<VideoMedia>(&mirror, 0).await.is_some());
}

#[tokio::test]
async fn test_removing_joystream_location_removes_dependent_media_chain() {
    let mirror = mirror().await;
    let w = next_id(&mirror).await;
    let input = transaction(2, 0, vec![
        create(DomainClass::JoystreamMediaLocation),
        create(DomainClass::MediaLocation),
        create(DomainClass::VideoMedia),
        create(DomainClass::Video),
        schema(0, vec![text(JOYSTREAM_DATA_OBJECT, "obj-42")]),
        schema(1, vec![local(LOCATION_JOYSTREAM, 0)]),
        schema(2, vec![local(MEDIA_LOCATION, 1)]),
        schema(3, vec![local(VIDEO_MEDIA, 2)]),
    ]);
    mirror.apply(&input).await.unwrap();
    mirror.apply(&removed(3, w)).await.unwrap();

    assert!(find::<JoystreamMediaLocation>(&mirror, w).await.is_none());
    assert!(find::<MediaLocation>(&mirror, w + 1).await.is_none());
    assert!(find::<VideoMedia>(&mirror, w + 2).await.is_none());
    assert!(find::<Video>(&mirror, w + 3).await.is_none());
    assert!(find::<JoystreamMediaLocation>(&mirror, 0).await.is_some());
    assert!(find::<MediaLocation>(&mirror, 0).await.is_some());
    assert!(find::<VideoMedia>(&mirror, 0).await.is_some());
    assert!(find::<Video>(&mirror, 0).await.is_some());
}

#[tokio::test]
async fn test_removing_media_location_removes_matching_media() {
    let mirror = mirror().await;
    let w = next_id(&mirror).await;
    let input = transaction(2, 0, vec![
        create(DomainClass::HttpMediaLocation),
        create(DomainClass::MediaLocation),
        create(DomainClass::VideoMedia),
        create(DomainClass::Video),
        schema(0, vec![text(HTTP_URL, "https://mirror.example")]),
        schema(1, vec![local(LOCATION_HTTP, 0)]),
        schema(2, vec![local(MEDIA_LOCATION, 1)]),
        schema(3, vec![local(VIDEO_MEDIA, 2)]),
    ]);
    mirror.apply(&input).await.unwrap();
    mirror.apply(&removed(3, w + 1)).await.unwrap();

    assert!(find::<MediaLocation>(&mirror, w + 1).await.is_none());
    assert!(find::<VideoMedia>(&mirror, w + 2).await.is_none());
    assert!(find::<Video>(&mirror, w + 3).await.is_none());
    assert!(find::<HttpMediaLocation>(&mirror, w).await.is_some());
    assert!(find::<MediaLocation>(&mirror, 0).await.is_some());
    assert!(find::<VideoMedia>(&mirror, 0).await.is_some());
}

#[tokio::test]
async fn test_removing_video_media_removes_its_videos() {
    let mirror = mirror().await;
    let w = next_id(&mirror).await;
    let input = transaction(2, 0, vec![
        create(DomainClass::VideoMedia),
        create(DomainClass::Video),
        create(DomainClass::Video),
        schema(0, vec![single(MEDIA_PIXEL_WIDTH, InputValue::Uint16(640))]),
        schema(1, vec![local(VIDEO_MEDIA, 0)]),
        schema(2, vec![text(VIDEO_TITLE, "template media")]),
    ]);
    mirror.apply(&input).await.unwrap();
    assert_eq!(find::<VideoMedia>(&mirror, w).await.unwrap().pixel_width, 640);

    mirror.apply(&removed(3, w)).await.unwrap();
    assert!(find::<VideoMedia>(&mirror, w).await.is_none());
    assert!(find::<Video>(&mirror, w + 1).await.is_none());
    assert!(class_entity(&mirror, w + 1).await.is_none());
    assert!(find::<Video>(&mirror, w + 2).await.is_some());
    assert!(find::<VideoMedia>(&mirror, 0).await.is_some());
}

#[tokio::test]
async fn test_removing_encoding_detaches_media() {
    let mirror = mirror().await;
    let w = next_id(&mirror).await;
    let input = transaction(2, 0, vec![
        create(DomainClass::VideoMediaEncoding),
        create(DomainClass::VideoMedia),
        schema(0, vec![text(ENCODING_NAME, "AV1")]),
        schema(1, vec![local(MEDIA_ENCODING, 0)]),
    ]);
    mirror.apply(&input).await.unwrap();
    assert_eq!(find::<VideoMedia>(&mirror, w + 1).await.unwrap().encoding, Some(w));

    mirror.apply(&removed(3, w)).await.unwrap();
    assert!(find::<VideoMediaEncoding>(&mirror, w).await.is_none());
    assert!(class_entity(&mirror, w).await.is_none());
    assert_eq!(find::<VideoMedia>(&mirror, w + 1).await.unwrap().encoding, None);
    assert!(find::<VideoMediaEncoding>(&mirror, 0).await.is_some());
}
