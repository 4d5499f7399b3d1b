//! # Collections
//!
//! User-defined sets of packages from `collections.kdl`:
//!
//! ```kdl
//! collection "dev-tools" {
//!     title "Developer tools"
//!     description "Everything for a fresh machine"
//!     author "alice"
//!     item "urn:gh-repo:BurntSushi:ripgrep"
//!     item "urn:winget:Git.Git"
//! }
//! ```
//!
//! Each collection is `urn:collection:<author>:<id>`. Items are resolved
//! through the registry, so a collection may hold packages from any handler
//! (including other collections).

use super::{HandlerContext, PackageHandler, ensure_owner};
use crate::constants::APP_SCHEME;
use crate::core::deep_link::{self, DeepLink};
use crate::core::{Image, ImageKind, PackageStatus, PackageUrn};
use crate::error::{Result, UnipkgError};
use crate::package::{Package, PackageBackend, PackageMeta};
use crate::utils::paths;
use kdl::{KdlDocument, KdlNode};
use reqwest::Url;
use std::any::Any;
use std::fs;
use std::path::{Path, PathBuf};

pub const HANDLER_ID: &str = "collections";
pub const NAMESPACE_COLLECTION: &str = "collection";

const DEFAULT_AUTHOR: &str = "local";

/// One `collection` block.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionDefinition {
    pub id: String,
    pub author: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub items: Vec<PackageUrn>,
}

impl CollectionDefinition {
    pub fn urn(&self) -> PackageUrn {
        PackageUrn::new(NAMESPACE_COLLECTION, [self.author.as_str(), self.id.as_str()])
    }

    fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        [Some(&self.id), self.title.as_ref(), self.description.as_ref()]
            .into_iter()
            .flatten()
            .any(|text| text.to_lowercase().contains(&query))
    }
}

pub fn parse_collections(content: &str) -> Result<Vec<CollectionDefinition>> {
    let doc = KdlDocument::parse(content)
        .map_err(|e| UnipkgError::Config(format!("Failed to parse collections: {}", e)))?;

    let mut definitions = Vec::new();
    for node in doc.nodes() {
        if node.name().value() != "collection" {
            tracing::warn!(node = node.name().value(), "ignoring unknown node in collections file");
            continue;
        }
        definitions.push(parse_collection(node)?);
    }
    Ok(definitions)
}

fn parse_collection(node: &KdlNode) -> Result<CollectionDefinition> {
    let id = node
        .entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_string())
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| UnipkgError::Config("collection expects an id: collection \"<id>\" { ... }".to_string()))?
        .to_string();

    let mut definition = CollectionDefinition {
        id,
        author: DEFAULT_AUTHOR.to_string(),
        title: None,
        description: None,
        items: Vec::new(),
    };

    let children = node.children().map(|doc| doc.nodes()).unwrap_or_default();
    for child in children {
        let values: Vec<&str> = child
            .entries()
            .iter()
            .filter_map(|e| e.value().as_string())
            .collect();

        match child.name().value() {
            "title" => definition.title = values.first().map(|v| v.to_string()),
            "description" => definition.description = values.first().map(|v| v.to_string()),
            "author" => {
                if let Some(author) = values.first().filter(|a| !a.trim().is_empty()) {
                    definition.author = author.to_string();
                }
            }
            "item" => {
                for value in values {
                    let urn = PackageUrn::parse(value.trim()).map_err(|e| {
                        UnipkgError::Config(format!("collection '{}': {}", definition.id, e))
                    })?;
                    definition.items.push(urn);
                }
            }
            other => {
                tracing::warn!(collection = %definition.id, field = other, "ignoring unknown collection field");
            }
        }
    }

    Ok(definition)
}

#[derive(Debug, Clone)]
pub struct CollectionBackend {
    pub author: String,
    pub id: String,
    pub item_urns: Vec<PackageUrn>,
}

impl PackageBackend for CollectionBackend {
    fn type_tag(&self) -> &'static str {
        "collection"
    }

    fn identity(&self) -> Vec<String> {
        vec![self.author.clone(), self.id.clone()]
    }

    fn derive_urn(&self) -> PackageUrn {
        PackageUrn::new(NAMESPACE_COLLECTION, [self.author.as_str(), self.id.as_str()])
    }

    fn display_fields(&self) -> Vec<(&'static str, String)> {
        vec![("Apps", self.item_urns.len().to_string())]
    }

    fn clone_box(&self) -> Box<dyn PackageBackend> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug, Default)]
pub struct CollectionsHandler {
    file: Option<PathBuf>,
}

impl CollectionsHandler {
    /// Reads `collections.kdl` from the config directory on each call.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(path: impl Into<PathBuf>) -> Self {
        Self {
            file: Some(path.into()),
        }
    }

    fn file(&self) -> Result<PathBuf> {
        match &self.file {
            Some(path) => Ok(path.clone()),
            None => paths::collections_file(),
        }
    }

    pub fn definitions(&self) -> Result<Vec<CollectionDefinition>> {
        let path = self.file()?;
        load_definitions(&path)
    }

    fn definition(&self, urn: &PackageUrn) -> Result<CollectionDefinition> {
        let [author, id] = urn.parts() else {
            return Err(UnipkgError::InvalidUrn {
                input: urn.to_string(),
                reason: "expected <author>:<id>".to_string(),
            });
        };

        self.definitions()?
            .into_iter()
            .find(|d| &d.author == author && &d.id == id)
            .ok_or_else(|| UnipkgError::NotFound(urn.to_string()))
    }

    /// A collection shell: metadata and item count, children not resolved yet.
    fn shell(&self, definition: CollectionDefinition, status: PackageStatus) -> Package {
        let meta = PackageMeta {
            title: Some(definition.title.clone().unwrap_or_else(|| definition.id.clone())),
            description: definition.description.clone(),
            publisher_id: Some(definition.author.clone()),
            developer_name: Some(definition.author.clone()),
            ..PackageMeta::default()
        };
        let backend = CollectionBackend {
            author: definition.author,
            id: definition.id,
            item_urns: definition.items,
        };
        Package::collection(HANDLER_ID, backend, status).with_meta(meta)
    }
}

fn load_definitions(path: &Path) -> Result<Vec<CollectionDefinition>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(path).map_err(|e| UnipkgError::io(path, e))?;
    parse_collections(&content)
}

impl PackageHandler for CollectionsHandler {
    fn id(&self) -> &str {
        HANDLER_ID
    }

    fn display_name(&self) -> &str {
        "Collections"
    }

    fn handled_namespaces(&self) -> Vec<&str> {
        vec![NAMESPACE_COLLECTION]
    }

    fn image(&self) -> Image {
        Image::text_from_name("Collections", ImageKind::Icon)
    }

    /// Resolves every item to `Details`. Items that fail to resolve are left
    /// out with a warning; a cycle fails the whole collection.
    fn get_package(
        &self,
        urn: &PackageUrn,
        _min_status: PackageStatus,
        cx: &HandlerContext<'_>,
    ) -> Result<Package> {
        let definition = self.definition(urn)?;
        let own = definition.urn();
        let item_urns = definition.items.clone();
        let mut package = self.shell(definition, PackageStatus::Details);

        for item_urn in &item_urns {
            let item = match cx.resolve_nested(&own, item_urn, PackageStatus::Details) {
                Ok(item) => item,
                Err(error) if matches!(error.root(), UnipkgError::CyclicCollection(_)) => {
                    return Err(error);
                }
                Err(error) => {
                    tracing::warn!(collection = %own, item = %item_urn, %error, "skipping unresolvable collection item");
                    continue;
                }
            };
            package.add_item(item)?;
        }

        Ok(package)
    }

    fn get_package_from_url(
        &self,
        url: &Url,
        cx: &HandlerContext<'_>,
    ) -> Result<Option<Package>> {
        if url.scheme() != APP_SCHEME {
            return Ok(None);
        }
        match deep_link::parse(url.as_str()) {
            Ok(DeepLink::Package(urn)) if urn.namespace() == NAMESPACE_COLLECTION => {
                self.get_package(&urn, PackageStatus::Details, cx).map(Some)
            }
            _ => Ok(None),
        }
    }

    fn get_url_from_package(&self, package: &Package) -> Result<Url> {
        ensure_owner(self, package)?;
        let link = deep_link::package_link(package.urn());
        Url::parse(&link).map_err(|e| UnipkgError::InvalidArgument(format!("{}: {}", link, e)))
    }

    fn search(&self, query: &str, _cx: &HandlerContext<'_>) -> Result<Vec<Package>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .definitions()?
            .into_iter()
            .filter(|d| d.matches(query.trim()))
            .map(|d| self.shell(d, PackageStatus::BasicDetails))
            .collect())
    }

    fn collections(&self, _cx: &HandlerContext<'_>) -> Result<Vec<Package>> {
        Ok(self
            .definitions()?
            .into_iter()
            .map(|d| self.shell(d, PackageStatus::BasicDetails))
            .collect())
    }
}
