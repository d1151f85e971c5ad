/*!
# Relief DevKit - Stubs and helpers for dashboard development

Library for exercising the dashboard controllers without live services:
- Scripted backend and geocoder (per-path replies, delays, failures)
- Stub HTTP backend on axum for the reqwest collaborators
- Test harness wiring a full dashboard on an in-memory page and map
*/

pub mod backend_stub;
pub mod http_stub;
pub mod test_utils;

pub use backend_stub::{Call, MockBackend, MockGeocoder, PayloadBuilder, Reply};
pub use http_stub::StubServer;
pub use test_utils::TestHarness;
