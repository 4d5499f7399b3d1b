//! Listing commands: `search`, `suggest`, `featured`, `collections`.
//!
//! Every enabled handler is queried concurrently by the registry. A handler
//! that fails is logged and left out; the command still succeeds with what
//! the others returned.

use crate::error::Result;
use crate::handlers::PackageService;
use crate::package::{Package, PackageSummary};
use crate::ui as output;
use crate::utils::machine_output;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listing {
    Search,
    Suggest,
    Featured,
    Collections,
}

impl Listing {
    fn command(self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Suggest => "suggest",
            Self::Featured => "featured",
            Self::Collections => "collections",
        }
    }

    fn heading(self, query: Option<&str>) -> String {
        match (self, query) {
            (Self::Search, Some(query)) => format!("Results for '{}'", query),
            (Self::Suggest, Some(query)) => format!("Suggestions for '{}'", query),
            (Self::Featured, _) => "Featured".to_string(),
            _ => "Collections".to_string(),
        }
    }
}

pub struct SearchOptions {
    pub listing: Listing,
    pub query: Option<String>,
    pub limit: Option<usize>,
    pub json: bool,
}

pub fn run(service: &PackageService, options: SearchOptions) -> Result<()> {
    let query = options.query.as_deref().unwrap_or_default();
    let mut packages = match options.listing {
        Listing::Search => service.search_all(query),
        Listing::Suggest => service.suggestions_all(query),
        Listing::Featured => service.featured_all(),
        Listing::Collections => service.collections_all(),
    };
    if let Some(limit) = options.limit {
        packages.truncate(limit);
    }

    if options.json {
        let summaries: Vec<PackageSummary> = packages.iter().map(Package::summary).collect();
        return machine_output::emit(options.listing.command(), summaries, Vec::new());
    }

    output::header(&options.listing.heading(options.query.as_deref()));
    output::package_list(&packages);
    Ok(())
}
