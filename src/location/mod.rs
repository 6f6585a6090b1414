//! Location resolution engine.
//!
//! Turns free text or a `"lat,lon"` literal into a [`LocationResult`] by
//! walking an ordered chain of providers (MapmyIndia, Google) and falling
//! back to a built-in gazetteer. Individual stages may fail; the resolver
//! itself only ever answers `Some(result)` or `None`.

pub mod cache;
pub mod eloc;
pub mod granularity;
pub mod http;
pub mod normalize;
pub mod providers;
pub mod resolver;
pub mod token;
pub mod types;

pub use cache::{AccessToken, TokenCache};
pub use granularity::{radius_for, Granularity};
pub use providers::{gazetteer_list, gazetteer_lookup, GazetteerInfo, ResolveStrategy};
pub use resolver::{parse_coordinates, LocationResolver};
pub use types::{Coordinates, LocationError, LocationResult, LocationSource};
