use serde::{Deserialize, Serialize};

/// Store API catalog document.
///
/// Only the vendor → application → version path the installer needs is
/// modelled; unknown fields are ignored. A body that does not match this
/// shape is rejected when it is parsed rather than checked field by field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogDocument {
    pub data: CatalogData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogData {
    pub relationships: CatalogRelationships,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRelationships {
    pub vendors: Relation<Vendor>,
}

/// JSON:API style `{ "data": [...] }` wrapper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

impl<T> Relation<T> {
    pub fn new(data: Vec<T>) -> Self {
        Self { data }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vendor {
    pub relationships: VendorRelationships,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorRelationships {
    pub applications: Relation<Application>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: u64,
    pub attributes: ApplicationAttributes,
    pub relationships: ApplicationRelationships,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationAttributes {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationRelationships {
    pub versions: Relation<Version>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Version {
    pub attributes: VersionAttributes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionAttributes {
    pub archive_url: String,
}

/// One installable application as projected out of the catalog
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CatalogEntry {
    pub id: u64,
    pub name: String,
    pub archive_url: String,
}

impl CatalogDocument {
    /// Build a document from `(vendor applications)` groups. Each application
    /// is `(id, name, archive urls)`; handy for synthetic catalogs.
    pub fn from_vendors(vendors: Vec<Vec<(u64, &str, Vec<&str>)>>) -> Self {
        let vendors = vendors
            .into_iter()
            .map(|apps| Vendor {
                relationships: VendorRelationships {
                    applications: Relation::new(
                        apps.into_iter()
                            .map(|(id, name, urls)| Application {
                                id,
                                attributes: ApplicationAttributes {
                                    name: name.to_string(),
                                },
                                relationships: ApplicationRelationships {
                                    versions: Relation::new(
                                        urls.into_iter()
                                            .map(|url| Version {
                                                attributes: VersionAttributes {
                                                    archive_url: url.to_string(),
                                                },
                                            })
                                            .collect(),
                                    ),
                                },
                            })
                            .collect(),
                    ),
                },
            })
            .collect();

        CatalogDocument {
            data: CatalogData {
                relationships: CatalogRelationships {
                    vendors: Relation::new(vendors),
                },
            },
        }
    }
}
