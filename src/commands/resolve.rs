//! `unipkg resolve <target>`

use crate::core::PackageStatus;
use crate::error::Result;
use crate::handlers::PackageService;
use crate::package::PackageSummary;
use crate::ui as output;
use crate::utils::machine_output;
use serde::Serialize;

pub struct ResolveOptions {
    pub target: String,
    pub status: PackageStatus,
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct ResolveOut {
    package: PackageSummary,
    url: Option<String>,
}

pub fn run(service: &PackageService, options: ResolveOptions) -> Result<()> {
    let mut package = service.resolve(&options.target, options.status)?;
    let cx = service.context();

    // Artwork is cosmetic; a failing image lookup never fails the command.
    if let Err(error) = package.cache_app_icon(cx) {
        tracing::debug!(urn = %package.urn(), %error, "no app icon");
    }
    if let Err(error) = package.cache_hero_image(cx) {
        tracing::debug!(urn = %package.urn(), %error, "no hero image");
    }

    let url = match service.url_for(&package) {
        Ok(url) => Some(url.to_string()),
        Err(error) => {
            tracing::debug!(urn = %package.urn(), %error, "package has no public URL");
            None
        }
    };

    if options.json {
        return machine_output::emit(
            "resolve",
            ResolveOut {
                package: package.summary(),
                url,
            },
            Vec::new(),
        );
    }

    output::package_details(&package, url.as_deref());
    Ok(())
}
