//! Partial postcode centroids.

mod support;

use postcode_resolver::ResolveError;
use support::*;

#[tokio::test]
async fn test_outward_code_centroid() {
    let resolver = london_resolver();
    let partial = resolver.partial_postcode("SW1A").await.unwrap();

    assert_eq!(partial.code, "SW1A");
    // SW1A 1AAX is too long, SW1A 9ZZ has no location and SW1A 0AA is retired
    let location = partial.location.unwrap();
    assert!((location.x() - (SW1A1AA.0 + SW1A2BB.0) / 2.0).abs() < 1e-9);
    assert!((location.y() - (SW1A1AA.1 + SW1A2BB.1) / 2.0).abs() < 1e-9);
    assert!(partial.validity.contains(2));
}

#[tokio::test]
async fn test_full_postcode_is_reduced() {
    let resolver = london_resolver();
    let from_full = resolver.partial_postcode("sw1a 2bb").await.unwrap();
    let from_partial = resolver.partial_postcode("SW1A").await.unwrap();

    assert_eq!(from_full.code, "SW1A");
    assert_eq!(from_full.location, from_partial.location);
}

#[tokio::test]
async fn test_single_member() {
    let resolver = london_resolver();
    let partial = resolver.partial_postcode("JE2").await.unwrap();
    let location = partial.location.unwrap();
    assert_eq!((location.x(), location.y()), (-2.1, 49.18));
}

#[tokio::test]
async fn test_invalid_partial() {
    let resolver = london_resolver();
    for input in ["", "1SW", "QQQQ", "SW1AA1"] {
        let err = resolver.partial_postcode(input).await.unwrap_err();
        assert!(
            matches!(err, ResolveError::InvalidFormat { .. }),
            "{input:?}: {err:?}"
        );
    }
}

#[tokio::test]
async fn test_unknown_prefix() {
    let resolver = london_resolver();
    let err = resolver.partial_postcode("EC1A").await.unwrap_err();
    assert_eq!(
        err,
        ResolveError::NotFound {
            message: "Postcode not found".into()
        }
    );
}
