// SPDX-License-Identifier: MIT

use super::*;

fn alert(sig: &str) -> PopupAlert {
    PopupAlert {
        signature: sig.to_string(),
        title: format!("node failed: {sig}"),
        body: "see log for details".to_string(),
    }
}

#[test]
fn first_alert_is_shown() {
    let mut store = PopupStore::new();
    let t0 = Instant::now();
    assert!(store.post(alert("boom"), t0));
    assert_eq!(store.current().unwrap().signature, "boom");
}

#[test]
fn duplicate_signature_does_not_replace_current() {
    let mut store = PopupStore::new();
    let t0 = Instant::now();
    store.post(alert("boom"), t0);
    let replaced = store.post(alert("boom"), t0 + Duration::from_secs(1));
    assert!(!replaced);
    assert_eq!(store.current().unwrap().title, "node failed: boom");
}

#[test]
fn new_signature_overwrites_older_popup() {
    let mut store = PopupStore::new();
    let t0 = Instant::now();
    store.post(alert("boom"), t0);
    let replaced = store.post(alert("segfault"), t0);
    assert!(replaced);
    assert_eq!(store.current().unwrap().signature, "segfault");
}

#[test]
fn popup_auto_dismisses_after_deadline() {
    let mut store = PopupStore::new();
    let t0 = Instant::now();
    store.post(alert("boom"), t0);

    store.tick(t0 + Duration::from_secs(1));
    assert!(store.current().is_some());

    store.tick(t0 + DEFAULT_DISMISS_AFTER);
    assert!(store.current().is_none());
}

#[test]
fn operator_can_dismiss_early() {
    let mut store = PopupStore::new();
    let t0 = Instant::now();
    store.post(alert("boom"), t0);
    store.dismiss();
    assert!(store.current().is_none());
}

#[test]
fn only_one_popup_visible_at_a_time() {
    let mut store = PopupStore::new();
    let t0 = Instant::now();
    store.post(alert("a"), t0);
    store.post(alert("b"), t0);
    store.post(alert("c"), t0);
    // Only the most recent distinct alert is live.
    assert_eq!(store.current().unwrap().signature, "c");
}
