use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        CaptureError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        CaptureError::timeline("x")
            .to_string()
            .contains("timeline error:")
    );
    assert!(CaptureError::render("x").to_string().contains("render error:"));
    assert!(CaptureError::encode("x").to_string().contains("encode error:"));
}

#[test]
fn io_error_names_the_path() {
    let err = CaptureError::io(
        "Output/walk/walk000.png",
        std::io::Error::other("disk full"),
    );
    let msg = err.to_string();
    assert!(msg.contains("Output/walk/walk000.png"));
    assert!(msg.contains("disk full"));
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = CaptureError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
