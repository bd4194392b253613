//! Stockset membership port trait.

use crate::domain::error::ScreenerError;

pub trait StocksetPort {
    /// Members of a named set, `None` when no such set exists.
    fn named_stockset(&self, name: &str) -> Result<Option<Vec<String>>, ScreenerError>;

    /// Members of one of `owner`'s holding lists.
    fn holdings(&self, owner: &str, id: &str) -> Result<Option<Vec<String>>, ScreenerError>;

    /// Names that resolve, including the owner's holdings when given.
    fn list_stocksets(&self, owner: Option<&str>) -> Vec<String>;
}
