//! Repository methods on `LinkService`.

pub mod audit;
pub mod links;
pub mod lookup;
