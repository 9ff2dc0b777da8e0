//! Registry Tests
//!
//! Tests for handler binding sources, the duplicate policy and sentinel discovery.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tagwire::handler::{BindingSource, HandlerRegistry, HandlerSet, Sentinels};
use tagwire::protocol::{PayloadReader, Sentinel};
use tagwire::{protocol_tags, ClientConfig, WireError};

protocol_tags! {
    enum Reply: u16 {
        Ack = 1,
        Notice = 2,
        Status = 3,
        #[sentinel(Error)]
        Failed = 0xFF,
    }
}

protocol_tags! {
    enum Full: u8 {
        Data = 1,
        #[sentinel(NotMapped)]
        Missing = 2,
        #[sentinel(Unknown)]
        Strange = 3,
        #[sentinel(Error)]
        Broken = 4,
    }
}

protocol_tags! {
    enum Bare: u8 {
        Data = 1,
    }
}

protocol_tags! {
    enum Clashing: u8 {
        #[sentinel(Error)]
        First = 1,
        #[sentinel(Error)]
        Second = 2,
    }
}

fn strict() -> ClientConfig {
    ClientConfig::builder().skip_duplicate_bindings(false).build()
}

fn counter() -> (Arc<AtomicUsize>, impl Fn(Reply, &mut PayloadReader) + Send + Sync + 'static) {
    let count = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&count);
    (count, move |_tag: Reply, _payload: &mut PayloadReader| {
        c.fetch_add(1, Ordering::SeqCst);
    })
}

// =============================================================================
// Binding Source Tests
// =============================================================================

#[test]
fn test_annotated_member_binds_every_tag() {
    let handlers = HandlerSet::<Reply>::new().on_tags("updates", &[Reply::Notice, Reply::Status], |_, _| {});
    let registry = HandlerRegistry::build(&handlers, &ClientConfig::default()).unwrap();

    assert_eq!(registry.len(), 2);
    assert_eq!(registry.source(Reply::Notice), Some(BindingSource::Annotation));
    assert_eq!(registry.origin(Reply::Status), Some("updates"));
}

#[test]
fn test_member_bound_by_name() {
    let handlers = HandlerSet::<Reply>::new().on("Notice", |_, _| {}).on("NoSuchTag", |_, _| {});
    let registry = HandlerRegistry::build(&handlers, &ClientConfig::default()).unwrap();

    assert_eq!(registry.len(), 1);
    assert_eq!(registry.source(Reply::Notice), Some(BindingSource::Convention));
}

#[test]
fn test_name_binding_disabled() {
    let handlers = HandlerSet::<Reply>::new().on("Notice", |_, _| {});
    let config = ClientConfig::builder().map_by_name(false).build();
    let registry = HandlerRegistry::build(&handlers, &config).unwrap();

    assert!(registry.is_empty());
}

#[test]
fn test_manual_binding() {
    let handlers = HandlerSet::<Reply>::new().manual(Reply::Status, |_, _| {});
    let registry = HandlerRegistry::build(&handlers, &ClientConfig::default()).unwrap();

    assert_eq!(registry.source(Reply::Status), Some(BindingSource::Manual));
    assert_eq!(registry.origin(Reply::Status), Some("manual binding"));
}

#[test]
fn test_scan_disabled_binds_nothing() {
    let handlers = HandlerSet::<Reply>::new()
        .on_tags("updates", &[Reply::Notice], |_, _| {})
        .on("Status", |_, _| {})
        .manual(Reply::Ack, |_, _| {});
    let config = ClientConfig::builder().scan_handlers(false).build();
    let registry = HandlerRegistry::build(&handlers, &config).unwrap();

    assert!(registry.is_empty());
}

#[test]
fn test_empty_provider() {
    let registry = HandlerRegistry::<Reply>::build(&(), &ClientConfig::default()).unwrap();
    assert!(registry.is_empty());
}

// =============================================================================
// Duplicate Policy Tests
// =============================================================================

#[test]
fn test_skip_keeps_first_binding() {
    let (first, first_cb) = counter();
    let (second, second_cb) = counter();
    let handlers = HandlerSet::<Reply>::new()
        .on_tags("first", &[Reply::Notice], first_cb)
        .on("Notice", second_cb);
    let registry = HandlerRegistry::build(&handlers, &ClientConfig::default()).unwrap();

    assert!(registry.dispatch(Reply::Notice, &mut PayloadReader::new(Vec::new())));
    assert_eq!(first.load(Ordering::SeqCst), 1);
    assert_eq!(second.load(Ordering::SeqCst), 0);
    assert_eq!(registry.origin(Reply::Notice), Some("first"));
}

#[test]
fn test_skip_applies_to_manual_bindings() {
    let handlers = HandlerSet::<Reply>::new()
        .on("Ack", |_, _| {})
        .manual(Reply::Ack, |_, _| {});
    let registry = HandlerRegistry::build(&handlers, &ClientConfig::default()).unwrap();

    assert_eq!(registry.source(Reply::Ack), Some(BindingSource::Convention));
}

#[test]
fn test_strict_rejects_duplicate() {
    let handlers = HandlerSet::<Reply>::new()
        .on_tags("a", &[Reply::Ack], |_, _| {})
        .on_tags("b", &[Reply::Ack], |_, _| {});

    let result = HandlerRegistry::build(&handlers, &strict());
    assert!(matches!(result, Err(WireError::BindingExists(_))));
}

#[test]
fn test_strict_rejects_manual_over_member() {
    let handlers = HandlerSet::<Reply>::new()
        .on("Status", |_, _| {})
        .manual(Reply::Status, |_, _| {});

    let result = HandlerRegistry::build(&handlers, &strict());
    assert!(matches!(result, Err(WireError::BindingExists(_))));
}

#[test]
fn test_strict_allows_distinct_tags() {
    let handlers = HandlerSet::<Reply>::new()
        .on_tags("a", &[Reply::Ack], |_, _| {})
        .on("Notice", |_, _| {})
        .manual(Reply::Status, |_, _| {});

    let registry = HandlerRegistry::build(&handlers, &strict()).unwrap();
    assert_eq!(registry.len(), 3);
}

// =============================================================================
// Dispatch Tests
// =============================================================================

#[test]
fn test_dispatch_passes_tag_and_payload() {
    let seen = Arc::new(parking_lot::Mutex::new(None));
    let s = Arc::clone(&seen);
    let handlers = HandlerSet::<Reply>::new().on_tags("status", &[Reply::Status], move |tag, payload| {
        *s.lock() = Some((tag, payload.read_string().unwrap()));
    });
    let registry = HandlerRegistry::build(&handlers, &ClientConfig::default()).unwrap();

    let mut payload = PayloadReader::new(vec![0, 0, 0, 2, b'o', b'k']);
    assert!(registry.dispatch(Reply::Status, &mut payload));
    assert_eq!(*seen.lock(), Some((Reply::Status, "ok".to_string())));

    assert!(!registry.dispatch(Reply::Ack, &mut PayloadReader::new(Vec::new())));
}

// =============================================================================
// Sentinel Discovery Tests
// =============================================================================

#[test]
fn test_all_sentinels_declared() {
    let sentinels = Sentinels::<Full>::discover().unwrap();

    assert_eq!(sentinels.error, Some(Full::Broken));
    assert_eq!(sentinels.unknown, Some(Full::Strange));
    assert_eq!(sentinels.not_mapped, Some(Full::Missing));

    assert_eq!(sentinels.classify(Full::Missing), Some(Sentinel::NotMapped));
    assert_eq!(sentinels.classify(Full::Strange), Some(Sentinel::Unknown));
    assert_eq!(sentinels.classify(Full::Broken), Some(Sentinel::Error));
    assert_eq!(sentinels.classify(Full::Data), None);
}

#[test]
fn test_sentinel_fallbacks() {
    let sentinels = Sentinels::<Reply>::discover().unwrap();

    assert_eq!(sentinels.error, Some(Reply::Failed));
    assert_eq!(sentinels.unknown, Some(Reply::Failed));
    assert_eq!(sentinels.not_mapped, Some(Reply::Failed));

    // Shared tag is tested not-mapped first
    assert_eq!(sentinels.classify(Reply::Failed), Some(Sentinel::NotMapped));
}

#[test]
fn test_no_sentinels() {
    let sentinels = Sentinels::<Bare>::discover().unwrap();

    assert_eq!(sentinels.error, None);
    assert_eq!(sentinels.unknown, None);
    assert_eq!(sentinels.not_mapped, None);
    assert_eq!(sentinels.classify(Bare::Data), None);
}

#[test]
fn test_duplicate_sentinel_marker_rejected() {
    assert!(matches!(
        Sentinels::<Clashing>::discover(),
        Err(WireError::Protocol(_))
    ));
}
