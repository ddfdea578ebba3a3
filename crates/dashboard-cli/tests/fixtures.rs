//! Shared helpers for CLI integration tests.

use std::fs;
use std::path::Path;

use serde_json::json;

/// Writes a logged-in session for John Doe into `home`.
pub fn write_session(home: &Path) {
    let user = json!({
        "firstName": "John",
        "lastName": "Doe",
        "email": "john@example.com",
        "phoneNumber": "+254712345678"
    });
    let entries = json!({
        "isAuthenticated": "true",
        "user": user.to_string(),
    });
    fs::write(
        home.join("session.json"),
        serde_json::to_string_pretty(&entries).unwrap(),
    )
    .unwrap();
}
