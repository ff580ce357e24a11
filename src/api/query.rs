use url::Url;

use super::payload::AcceptType;
use crate::config::ClientConfig;
use crate::error::{Error, Result};

/// Shape used when the caller doesn't pick one.
pub const DEFAULT_SHAPE: &str = "Round";

/// `GET {root}/Prices/list?shape=..`
pub(crate) fn prices_list_url(root: &str, shape: &str) -> Result<Url> {
    let mut url = ClientConfig::endpoint(root, "/Prices/list")?;
    url.query_pairs_mut().append_pair("shape", shape);
    Ok(url)
}

/// `GET {root}/Prices/list?shape=..&csvnormalized=..`
pub(crate) fn normalized_prices_list_url(
    root: &str,
    shape: &str,
    csvnormalized: bool,
) -> Result<Url> {
    let mut url = ClientConfig::endpoint(root, "/Prices/list")?;
    url.query_pairs_mut()
        .append_pair("shape", shape)
        .append_pair("csvnormalized", if csvnormalized { "true" } else { "false" });
    Ok(url)
}

/// `GET {root}/Prices?shape=..&size=..&color=..&clarity=..`
pub(crate) fn price_items_url(root: &str, query: &PriceItemsQuery) -> Result<Url> {
    let size = required("size", query.size.as_deref())?;
    let color = required("color", query.color.as_deref())?;
    let clarity = required("clarity", query.clarity.as_deref())?;

    let mut url = ClientConfig::endpoint(root, "/Prices")?;
    url.query_pairs_mut()
        .append_pair("shape", &query.shape)
        .append_pair("size", size)
        .append_pair("color", color)
        .append_pair("clarity", clarity);
    Ok(url)
}

/// `GET {root}/Prices/changes?shape=..`
pub(crate) fn prices_changes_url(root: &str, shape: &str) -> Result<Url> {
    let mut url = ClientConfig::endpoint(root, "/Prices/changes")?;
    url.query_pairs_mut().append_pair("shape", shape);
    Ok(url)
}

fn required<'a>(name: &'static str, value: Option<&'a str>) -> Result<&'a str> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(Error::MissingArgument(name)),
    }
}

/// Filters for a single price lookup.
///
/// `size`, `color` and `clarity` have no defaults; leaving any of them out
/// fails the request before it is sent.
///
/// ```
/// use rapnet_pricelist::PriceItemsQuery;
///
/// let query = PriceItemsQuery::new()
///     .shape("Pear")
///     .size("1.01")
///     .color("G")
///     .clarity("VS1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceItemsQuery {
    shape: String,
    size: Option<String>,
    color: Option<String>,
    clarity: Option<String>,
    accept: AcceptType,
}

impl Default for PriceItemsQuery {
    fn default() -> Self {
        Self {
            shape: DEFAULT_SHAPE.to_string(),
            size: None,
            color: None,
            clarity: None,
            accept: AcceptType::default(),
        }
    }
}

impl PriceItemsQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shape(mut self, shape: impl Into<String>) -> Self {
        self.shape = shape.into();
        self
    }

    pub fn size(mut self, size: impl Into<String>) -> Self {
        self.size = Some(size.into());
        self
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn clarity(mut self, clarity: impl Into<String>) -> Self {
        self.clarity = Some(clarity.into());
        self
    }

    pub fn accept(mut self, accept: AcceptType) -> Self {
        self.accept = accept;
        self
    }

    pub fn accept_type(&self) -> AcceptType {
        self.accept
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOT: &str = "https://technet.rapnetapis.com/pricelist/api";

    #[test]
    fn prices_list_has_only_shape() {
        let url = prices_list_url(ROOT, "Princess").unwrap();
        assert_eq!(
            url.as_str(),
            "https://technet.rapnetapis.com/pricelist/api/Prices/list?shape=Princess"
        );
    }

    #[test]
    fn normalized_list_appends_flag_after_shape() {
        let url = normalized_prices_list_url(ROOT, "Round", true).unwrap();
        assert_eq!(url.query(), Some("shape=Round&csvnormalized=true"));

        let url = normalized_prices_list_url(ROOT, "Round", false).unwrap();
        assert_eq!(url.query(), Some("shape=Round&csvnormalized=false"));
    }

    #[test]
    fn price_items_keeps_parameter_order() {
        let query = PriceItemsQuery::new().size("0.5").color("D").clarity("IF");
        let url = price_items_url(ROOT, &query).unwrap();
        assert_eq!(url.path(), "/pricelist/api/Prices");
        assert_eq!(url.query(), Some("shape=Round&size=0.5&color=D&clarity=IF"));
    }

    #[test]
    fn parameters_are_url_encoded() {
        let query = PriceItemsQuery::new()
            .shape("Cushion Brilliant")
            .size("1.00-1.49")
            .color("K&L")
            .clarity("SI1/SI2");
        let url = price_items_url(ROOT, &query).unwrap();
        assert_eq!(
            url.query(),
            Some("shape=Cushion+Brilliant&size=1.00-1.49&color=K%26L&clarity=SI1%2FSI2")
        );

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs[2], ("color".to_string(), "K&L".to_string()));
    }

    #[test]
    fn price_items_requires_each_filter() {
        let missing_size = PriceItemsQuery::new().color("D").clarity("IF");
        assert!(matches!(
            price_items_url(ROOT, &missing_size),
            Err(Error::MissingArgument("size"))
        ));

        let missing_color = PriceItemsQuery::new().size("1").clarity("IF");
        assert!(matches!(
            price_items_url(ROOT, &missing_color),
            Err(Error::MissingArgument("color"))
        ));

        let blank_clarity = PriceItemsQuery::new().size("1").color("D").clarity("  ");
        assert!(matches!(
            price_items_url(ROOT, &blank_clarity),
            Err(Error::MissingArgument("clarity"))
        ));
    }

    #[test]
    fn changes_has_only_shape() {
        let url = prices_changes_url(ROOT, "Round").unwrap();
        assert_eq!(url.path(), "/pricelist/api/Prices/changes");
        assert_eq!(url.query(), Some("shape=Round"));
    }
}
