use super::{Package, PackageMeta};

type Accessor = fn(&PackageMeta) -> Option<String>;

/// Common metadata rows shown for every package, in display order.
pub static BASE_FIELDS: &[(&str, Accessor)] = &[
    ("Title", |m| m.title.clone()),
    ("Publisher", |m| m.publisher_id.clone()),
    ("Developer", |m| m.developer_name.clone()),
    ("Version", |m| m.version.clone()),
    ("Released", |m| {
        m.release_date.map(|d| d.format("%Y-%m-%d").to_string())
    }),
    ("Website", |m| m.website.as_ref().map(|l| l.url.clone())),
    ("Rating", |m| m.rating.map(|r| format!("{:.1}", r))),
    ("Description", |m| m.description.clone()),
];

impl Package {
    /// Populated `(label, value)` rows: the common metadata, then backend extras.
    pub fn display_fields(&self) -> Vec<(&'static str, String)> {
        BASE_FIELDS
            .iter()
            .filter_map(|(label, accessor)| accessor(&self.meta).map(|value| (*label, value)))
            .filter(|(_, value)| !value.trim().is_empty())
            .chain(self.backend.display_fields())
            .collect()
    }
}
