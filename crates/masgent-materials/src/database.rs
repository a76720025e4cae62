//! Remote materials database lookups.

use crate::element::Element;
use crate::formula::Formula;
use crate::lattice::{Lattice, Vec3};
use crate::structure::{Site, Structure};
use async_trait::async_trait;
use masgent_core::{MasgentError, MasgentResult};
use serde::Deserialize;
use tracing::{debug, info};

/// Default public Materials Project API endpoint.
pub const DEFAULT_MP_BASE_URL: &str = "https://api.materialsproject.org";

/// The most stable database entry for a formula.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialMatch {
    /// Database id such as `mp-22862`.
    pub material_id: String,
    /// Reduced formula as reported by the database.
    pub formula: String,
    /// eV/atom; 0 for a ground state.
    pub energy_above_hull: Option<f64>,
    /// The entry's crystal structure.
    pub structure: Structure,
}

/// A source of known crystal structures keyed by chemical formula.
#[async_trait]
pub trait MaterialsDatabase: Send + Sync {
    /// Returns the best (lowest energy above hull) match for `formula`.
    async fn best_match(&self, formula: &Formula) -> MasgentResult<MaterialMatch>;
}

/// Materials Project `summary` endpoint client.
pub struct MaterialsProjectClient {
    base_url: String,
    api_key: String,
    http: reqwest::Client,
}

impl MaterialsProjectClient {
    /// A client for the API at `base_url`.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            http: reqwest::Client::new(),
        }
    }
}

impl std::fmt::Debug for MaterialsProjectClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaterialsProjectClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    #[serde(default)]
    data: Vec<SummaryDoc>,
}

#[derive(Debug, Deserialize)]
struct SummaryDoc {
    material_id: String,
    #[serde(default)]
    formula_pretty: Option<String>,
    #[serde(default)]
    energy_above_hull: Option<f64>,
    structure: PymatgenStructure,
}

#[derive(Debug, Deserialize)]
struct PymatgenStructure {
    lattice: PymatgenLattice,
    sites: Vec<PymatgenSite>,
}

#[derive(Debug, Deserialize)]
struct PymatgenLattice {
    matrix: [Vec3; 3],
}

#[derive(Debug, Deserialize)]
struct PymatgenSite {
    species: Vec<PymatgenSpecies>,
    abc: Vec3,
}

#[derive(Debug, Deserialize)]
struct PymatgenSpecies {
    element: String,
    #[serde(default)]
    occu: Option<f64>,
}

impl PymatgenStructure {
    fn into_structure(self) -> MasgentResult<Structure> {
        let lattice = Lattice::new(self.lattice.matrix)?;
        let sites = self
            .sites
            .into_iter()
            .map(|site| {
                // Disordered sites keep their majority species.
                let species = site
                    .species
                    .iter()
                    .max_by(|a, b| {
                        a.occu
                            .unwrap_or(1.0)
                            .total_cmp(&b.occu.unwrap_or(1.0))
                    })
                    .ok_or_else(|| MasgentError::Database("site without species".to_string()))?;
                let element = Element::from_symbol(&species.element).ok_or_else(|| {
                    MasgentError::Database(format!("unknown element '{}'", species.element))
                })?;
                Ok(Site {
                    species: element,
                    frac_coords: site.abc,
                })
            })
            .collect::<MasgentResult<Vec<_>>>()?;
        Structure::new(lattice, sites)
    }
}

#[async_trait]
impl MaterialsDatabase for MaterialsProjectClient {
    async fn best_match(&self, formula: &Formula) -> MasgentResult<MaterialMatch> {
        let url = format!("{}/materials/summary/", self.base_url);
        debug!(formula = %formula, url = %url, "querying Materials Project");

        let resp = self
            .http
            .get(&url)
            .header("X-API-KEY", &self.api_key)
            .header("accept", "application/json")
            .query(&[
                ("formula", formula.as_str()),
                (
                    "_fields",
                    "material_id,formula_pretty,structure,energy_above_hull",
                ),
                ("_sort_fields", "energy_above_hull"),
                ("_limit", "1"),
            ])
            .send()
            .await
            .map_err(|e| MasgentError::Http(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(MasgentError::Database(format!(
                "Materials Project API error {status}: {body}"
            )));
        }

        let body: SummaryResponse = resp
            .json()
            .await
            .map_err(|e| MasgentError::Database(format!("unexpected response: {e}")))?;

        let best = body
            .data
            .into_iter()
            .min_by(|a, b| {
                a.energy_above_hull
                    .unwrap_or(f64::INFINITY)
                    .total_cmp(&b.energy_above_hull.unwrap_or(f64::INFINITY))
            })
            .ok_or_else(|| {
                MasgentError::Database(format!("no Materials Project entry for {formula}"))
            })?;

        info!(formula = %formula, material_id = %best.material_id, "Materials Project match");
        let label = best.formula_pretty.unwrap_or_else(|| formula.to_string());
        let structure = best
            .structure
            .into_structure()?
            .with_comment(format!("{label} {}", best.material_id));

        Ok(MaterialMatch {
            material_id: best.material_id,
            formula: label,
            energy_above_hull: best.energy_above_hull,
            structure,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn nacl_doc() -> serde_json::Value {
        serde_json::json!({
            "data": [{
                "material_id": "mp-22862",
                "formula_pretty": "NaCl",
                "energy_above_hull": 0.0,
                "structure": {
                    "lattice": {"matrix": [[0.0, 2.82, 2.82], [2.82, 0.0, 2.82], [2.82, 2.82, 0.0]]},
                    "sites": [
                        {"species": [{"element": "Na", "occu": 1}], "abc": [0.0, 0.0, 0.0]},
                        {"species": [{"element": "Cl", "occu": 1}], "abc": [0.5, 0.5, 0.5]}
                    ]
                }
            }]
        })
    }

    #[tokio::test]
    async fn test_best_match_decodes_structure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/materials/summary/"))
            .and(query_param("formula", "NaCl"))
            .and(query_param("_limit", "1"))
            .and(header("X-API-KEY", "mp-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(nacl_doc()))
            .expect(1)
            .mount(&server)
            .await;

        let client = MaterialsProjectClient::new(server.uri(), "mp-test");
        let found = client
            .best_match(&Formula::parse("NaCl").unwrap())
            .await
            .unwrap();
        assert_eq!(found.material_id, "mp-22862");
        assert_eq!(found.structure.num_sites(), 2);
        assert_eq!(found.structure.comment(), "NaCl mp-22862");
    }

    #[tokio::test]
    async fn test_empty_data_is_database_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": []})))
            .mount(&server)
            .await;

        let client = MaterialsProjectClient::new(server.uri(), "k");
        let err = client
            .best_match(&Formula::parse("He").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, MasgentError::Database(_)));
        assert!(err.to_string().contains("He"));
    }

    #[tokio::test]
    async fn test_http_error_status_surfaces() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let client = MaterialsProjectClient::new(server.uri(), "bad");
        let err = client
            .best_match(&Formula::parse("NaCl").unwrap())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("403"));
    }

    #[test]
    fn test_debug_redacts_key() {
        let client = MaterialsProjectClient::new("http://x", "secret");
        assert!(!format!("{client:?}").contains("secret"));
    }
}
