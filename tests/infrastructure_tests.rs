//! Infrastructure layer tests
//!
//! Tests for the cipher, storage backends, the document tree and the
//! message bus.

mod common;

use common::{fast_cipher, qr_image};
use lookout::domain::entities::{FetchImageReply, Request, ScanSnapshot, TabId};
use lookout::domain::repositories::{
    BusError, CipherError, Document, DocumentEvent, DrawError, EventSink, KeyValueStore,
    MessagePort, MutationBatch, NodeKind, PasswordCipher, TagSelector, request,
};
use lookout::infrastructure::cipher::{AesGcmCipher, CipherOptions, NONCE_LEN, SALT_LEN, TAG_LEN};
use lookout::infrastructure::dom::{DomError, DomTree, ImageSpec};
use lookout::infrastructure::messaging::{TabRegistry, channel};
use lookout::infrastructure::storage::{JsonFileStore, MemoryStore};
use proptest::prelude::*;
use rstest::*;
use serde_json::json;
use std::sync::Arc;
use tempfile::tempdir;

// ============================================================================
// Cipher Tests
// ============================================================================

#[fixture]
fn cipher() -> AesGcmCipher {
    fast_cipher()
}

#[rstest]
fn test_cipher_roundtrip(cipher: AesGcmCipher) {
    let secret = cipher.generate_key();
    let sealed = cipher.encrypt("meet at noon", &secret).unwrap();
    assert_eq!(cipher.decrypt(&sealed, &secret).unwrap(), "meet at noon");
}

#[rstest]
fn test_cipher_output_is_randomized(cipher: AesGcmCipher) {
    let a = cipher.encrypt("same", "pw").unwrap();
    let b = cipher.encrypt("same", "pw").unwrap();
    assert_ne!(a, b);
}

#[rstest]
fn test_cipher_output_passes_classifier(cipher: AesGcmCipher) {
    let sealed = cipher.encrypt("", "pw").unwrap();
    assert!(lookout::domain::services::looks_like_ciphertext(&sealed));
    assert_eq!(cipher.envelope_overhead(), SALT_LEN + NONCE_LEN + TAG_LEN);
}

#[rstest]
#[case::wrong_key("other")]
#[case::empty_key("")]
fn test_cipher_wrong_key(cipher: AesGcmCipher, #[case] wrong: &str) {
    let sealed = cipher.encrypt("payload", "right").unwrap();
    assert_eq!(cipher.decrypt(&sealed, wrong), Err(CipherError::Authentication));
}

#[rstest]
#[case::not_base64("!!!not base64!!!")]
#[case::too_short("AAAA")]
#[case::empty("")]
fn test_cipher_garbage_input(cipher: AesGcmCipher, #[case] input: &str) {
    assert_eq!(cipher.decrypt(input, "pw"), Err(CipherError::Authentication));
}

#[rstest]
fn test_cipher_tampered_ciphertext(cipher: AesGcmCipher) {
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;

    let sealed = cipher.encrypt("payload", "pw").unwrap();
    let mut raw = STANDARD.decode(&sealed).unwrap();
    let last = raw.len() - 1;
    raw[last] ^= 0x01;
    let tampered = STANDARD.encode(raw);
    assert_eq!(cipher.decrypt(&tampered, "pw"), Err(CipherError::Authentication));
}

#[rstest]
fn test_cipher_tolerates_wrapped_input(cipher: AesGcmCipher) {
    let sealed = cipher.encrypt("wrapped", "pw").unwrap();
    let (head, tail) = sealed.split_at(20);
    let wrapped = format!("  {head}\n{tail}\n");
    assert_eq!(cipher.decrypt(&wrapped, "pw").unwrap(), "wrapped");
}

#[rstest]
fn test_cipher_rejects_bad_options() {
    let options = CipherOptions {
        memory_kib: 1,
        iterations: 0,
        parallelism: 0,
    };
    assert!(matches!(
        AesGcmCipher::new(options),
        Err(CipherError::KeyDerivation(_))
    ));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_cipher_roundtrip(plaintext in ".{0,200}", secret in "[ -~]{1,32}") {
        let cipher = fast_cipher();
        let sealed = cipher.encrypt(&plaintext, &secret).unwrap();
        prop_assert_eq!(cipher.decrypt(&sealed, &secret).unwrap(), plaintext);
    }
}

// ============================================================================
// Storage Tests
// ============================================================================

#[rstest]
fn test_memory_store_basics() {
    let store = MemoryStore::new();
    assert_eq!(store.get("k").unwrap(), None);
    store.set("k", json!(1)).unwrap();
    store.set("k", json!(2)).unwrap();
    assert_eq!(store.get("k").unwrap(), Some(json!(2)));
    store.remove("k").unwrap();
    store.remove("k").unwrap();
    assert!(store.is_empty());
}

#[rstest]
#[case(json!(true), true)]
#[case(json!(false), false)]
#[case(json!("true"), false)]
#[case(json!(1), false)]
fn test_flag_reading(#[case] value: serde_json::Value, #[case] expected: bool) {
    let store = MemoryStore::new();
    store.set("flag", value).unwrap();
    assert_eq!(store.get_flag("flag").unwrap(), expected);
    assert!(!store.get_flag("missing").unwrap());
}

#[rstest]
fn test_json_file_store_persists_across_instances() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("storage.json");

    let store = JsonFileStore::new(&path).unwrap();
    store.set("autoScanEnabled", json!(true)).unwrap();
    store
        .set("ov_enc_key", json!({"key": "abc", "expiresAt": 5}))
        .unwrap();
    drop(store);

    let reopened = JsonFileStore::new(&path).unwrap();
    assert!(reopened.get_flag("autoScanEnabled").unwrap());
    assert_eq!(
        reopened.get("ov_enc_key").unwrap(),
        Some(json!({"key": "abc", "expiresAt": 5}))
    );

    reopened.remove("ov_enc_key").unwrap();
    assert_eq!(reopened.get("ov_enc_key").unwrap(), None);
    assert!(reopened.get_flag("autoScanEnabled").unwrap());
}

#[rstest]
fn test_json_file_store_recovers_from_corrupt_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("storage.json");
    std::fs::write(&path, b"{ not json").unwrap();

    let store = JsonFileStore::new(&path).unwrap();
    assert_eq!(store.get("anything").unwrap(), None);
    store.set("k", json!("v")).unwrap();
    assert_eq!(store.get("k").unwrap(), Some(json!("v")));
}

// ============================================================================
// Document Tree Tests
// ============================================================================

#[rstest]
fn test_tree_queries() {
    let tree = DomTree::new();
    let div = tree.create_element("DIV");
    let p = tree.create_element("p");
    let text = tree.create_text("hello");
    let img = tree.create_image(ImageSpec::loaded("https://x/a.png", qr_image("a", 60)));

    tree.append_child(p, text).unwrap();
    tree.append_children(div, &[p, img]).unwrap();
    tree.append_child(tree.body(), div).unwrap();

    let selector = TagSelector::parse("p, div");
    assert_eq!(tree.query_tags(&selector), vec![div, p]);
    assert!(tree.has_descendant_matching(div, &selector));
    assert!(!tree.has_descendant_matching(p, &selector));
    assert_eq!(tree.images(), vec![img]);
    assert_eq!(tree.descendant_images(div), vec![img]);
    assert_eq!(tree.text_content(div).as_deref(), Some("hello"));
    assert_eq!(tree.node_kind(img), Some(NodeKind::Image));
    assert_eq!(tree.image_state(img).unwrap().natural_width, 60);
}

#[rstest]
fn test_tree_rejects_bad_structure() {
    let tree = DomTree::new();
    let outer = tree.create_element("div");
    let inner = tree.create_element("div");
    let text = tree.create_text("t");
    tree.append_child(outer, inner).unwrap();

    assert_eq!(
        tree.append_child(inner, outer),
        Err(DomError::WouldCycle {
            parent: inner,
            child: outer
        })
    );
    assert_eq!(tree.append_child(text, inner), Err(DomError::NotAContainer(text)));
    assert!(matches!(
        tree.finish_loading(outer, qr_image("x", 60)),
        Err(DomError::NotAnImage(_))
    ));
}

#[rstest]
fn test_tree_draw_errors() {
    let tree = DomTree::new();
    let pending = tree.create_image(ImageSpec::pending("https://x/p.png"));
    let foreign =
        tree.create_image(ImageSpec::loaded("https://y/q.png", qr_image("q", 60)).cross_origin());

    assert_eq!(tree.draw_image(pending, 10, 10), Err(DrawError::NotAnImage(pending)));
    assert_eq!(tree.draw_image(foreign, 60, 60), Err(DrawError::Tainted));
}

#[tokio::test]
async fn test_tree_notifies_observers() {
    let tree = DomTree::new();
    let (sink, mut stream) = EventSink::channel();
    let observer = tree.observe(sink);

    // Detached subtrees are not part of the document yet.
    let div = tree.create_element("div");
    let p = tree.create_element("p");
    tree.append_child(div, p).unwrap();

    tree.append_child(tree.body(), div).unwrap();
    assert_eq!(
        stream.next().await,
        Some(DocumentEvent::Mutations(MutationBatch::new(vec![div])))
    );

    let img = tree.create_image(ImageSpec::pending("https://x/p.png"));
    tree.append_child(div, img).unwrap();
    tree.finish_loading(img, qr_image("p", 60)).unwrap();
    assert_eq!(
        stream.next().await,
        Some(DocumentEvent::Mutations(MutationBatch::new(vec![img])))
    );
    assert_eq!(stream.next().await, Some(DocumentEvent::ImageLoaded(img)));

    assert_eq!(tree.observer_count(), 1);
    tree.disconnect(observer);
    assert_eq!(tree.observer_count(), 0);
    assert_eq!(stream.next().await, None);
}

// ============================================================================
// Message Bus Tests
// ============================================================================

#[tokio::test]
async fn test_bus_request_reply() {
    let (endpoint, mut mailbox) = channel();
    let tab_endpoint = endpoint.from_tab(TabId(3));

    let server = tokio::spawn(async move {
        let incoming = mailbox.recv().await.unwrap();
        assert_eq!(incoming.sender, Some(TabId(3)));
        assert!(incoming.expects_reply());
        assert_eq!(incoming.request, Request::FetchImage { url: "u".into() });
        incoming
            .respond(&FetchImageReply {
                data_url: Some("data:x".into()),
            })
            .unwrap();
    });

    let reply: FetchImageReply = request(&tab_endpoint, &Request::FetchImage { url: "u".into() })
        .await
        .unwrap();
    assert_eq!(reply.data_url.as_deref(), Some("data:x"));
    server.await.unwrap();
}

#[tokio::test]
async fn test_bus_fire_and_forget() {
    let (endpoint, mut mailbox) = channel();
    assert!(matches!(
        endpoint.call(&Request::UpdateBadge { count: 1 }).await,
        Err(BusError::NoReplyExpected("UPDATE_BADGE"))
    ));

    endpoint.post(&Request::UpdateBadge { count: 2 }).unwrap();
    let incoming = mailbox.recv().await.unwrap();
    assert!(!incoming.expects_reply());
    assert_eq!(incoming.request, Request::UpdateBadge { count: 2 });
}

#[tokio::test]
async fn test_bus_receiver_gone() {
    let (endpoint, mailbox) = channel();
    drop(mailbox);
    assert!(!endpoint.is_connected());
    assert!(matches!(
        endpoint.call(&Request::GetResults).await,
        Err(BusError::ReceiverGone)
    ));
    assert!(matches!(
        endpoint.post(&Request::GetResults),
        Err(BusError::ReceiverGone)
    ));
}

#[tokio::test]
async fn test_closed_mailbox_rejects_requests() {
    let (endpoint, mut mailbox) = channel();
    mailbox.close();
    assert!(!endpoint.is_connected());
    assert!(matches!(
        endpoint.post(&Request::UpdateBadge { count: 1 }),
        Err(BusError::ReceiverGone)
    ));
}

#[tokio::test]
async fn test_bus_unanswered_request() {
    let (endpoint, mut mailbox) = channel();
    let server = tokio::spawn(async move {
        let incoming = mailbox.recv().await.unwrap();
        drop(incoming);
    });
    assert!(matches!(
        endpoint.call(&Request::GetResults).await,
        Err(BusError::NoReply)
    ));
    server.await.unwrap();
}

#[tokio::test]
async fn test_bus_reply_of_wrong_shape() {
    let (endpoint, mut mailbox) = channel();
    tokio::spawn(async move {
        let incoming = mailbox.recv().await.unwrap();
        incoming.respond(&json!({"unexpected": 1})).unwrap();
    });
    let reply: Result<ScanSnapshot, BusError> = request(&endpoint, &Request::GetResults).await;
    assert!(matches!(reply, Err(BusError::Malformed(_))));
}

#[rstest]
fn test_tab_registry_active_tab() {
    let registry = TabRegistry::new();
    let (endpoint, _mailbox) = channel();
    assert!(registry.is_empty());
    assert!(registry.active().is_none());

    registry.register(TabId(1), Arc::new(endpoint));
    assert!(registry.active().is_none());

    registry.activate(Some(TabId(1)));
    assert_eq!(registry.active().map(|(tab, _)| tab), Some(TabId(1)));

    registry.activate(Some(TabId(2)));
    assert!(registry.active().is_none());

    registry.activate(Some(TabId(1)));
    registry.unregister(TabId(1));
    assert!(registry.active().is_none());
    assert_eq!(registry.len(), 0);
}
