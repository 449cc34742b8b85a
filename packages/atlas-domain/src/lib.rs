pub mod filter;
pub mod geo;
pub mod page;
pub mod place;
pub mod taxonomy;

mod error;

pub use error::{Error, Result};
pub use filter::{ALL_CATEGORIES, FilterSet, PlaceFilter, PlaceOrder, PlaceQuery};
pub use geo::GeoPoint;
pub use page::Page;
pub use taxonomy::{CATEGORY_GROUPS, CategoryGroup};
