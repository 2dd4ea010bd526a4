//! services/api/src/bin/openapi.rs
//!
//! Writes the pantry REST API document as pretty JSON. The output path is the
//! first argument and defaults to `openapi.json`.

use api_lib::{error::ApiError, web::rest::ApiDoc};
use utoipa::OpenApi;

const DEFAULT_OUTPUT: &str = "openapi.json";

fn main() -> Result<(), ApiError> {
    let output = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_OUTPUT.to_string());

    let doc = ApiDoc::openapi();
    std::fs::write(&output, doc.to_pretty_json()?)?;
    println!(
        "Wrote OpenAPI document ({} paths) to {}",
        doc.paths.paths.len(),
        output
    );
    Ok(())
}
