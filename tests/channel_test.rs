//! Tests for `src/channel/` — media typing helpers and the tenant registry.

mod common;

use std::sync::Arc;

use common::MockChannel;
use docrelay::channel::cloud_api::{media_type, mime_type};
use docrelay::channel::registry::ChannelRegistry;

#[test]
fn known_extensions_map_to_mime_types() {
    assert_eq!(mime_type("facture.pdf"), "application/pdf");
    assert_eq!(mime_type("photo.jpg"), "image/jpeg");
    assert_eq!(mime_type("photo.jpeg"), "image/jpeg");
    assert_eq!(mime_type("scan.png"), "image/png");
}

#[test]
fn unknown_extension_falls_back_to_octet_stream() {
    assert_eq!(mime_type("archive.zip"), "application/octet-stream");
    assert_eq!(mime_type("no_extension"), "application/octet-stream");
}

#[test]
fn extension_matching_ignores_case() {
    assert_eq!(mime_type("FACTURE.PDF"), "application/pdf");
    assert_eq!(mime_type("Photo.JPG"), "image/jpeg");
}

#[test]
fn images_send_as_image_and_the_rest_as_document() {
    assert_eq!(media_type("photo.png"), "image");
    assert_eq!(media_type("photo.jpeg"), "image");
    assert_eq!(media_type("facture.pdf"), "document");
    assert_eq!(media_type("archive.zip"), "document");
}

#[test]
fn registry_resolves_registered_tenants_only() {
    let mut registry = ChannelRegistry::new();
    assert!(registry.is_empty());

    registry.register("acme", Arc::new(MockChannel::working()) as _);
    assert_eq!(registry.len(), 1);
    assert!(registry.get("acme").is_some());
    assert!(registry.get("nobody").is_none());
}

#[test]
fn registry_remove_unregisters_the_tenant() {
    let mut registry = ChannelRegistry::new();
    registry.register("acme", Arc::new(MockChannel::working()) as _);

    assert!(registry.remove("acme"));
    assert!(registry.get("acme").is_none());
    assert!(!registry.remove("acme"));
}

#[test]
fn re_registering_replaces_the_channel() {
    let mut registry = ChannelRegistry::new();
    registry.register("acme", Arc::new(MockChannel::working()) as _);
    registry.register("acme", Arc::new(MockChannel::failing_send()) as _);
    assert_eq!(registry.len(), 1);
}
