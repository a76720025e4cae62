#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Integration tests for masgent-materials: codecs, builders, presets and the
//! Materials Project client against a mock server.

use masgent_materials::{
    bulk, read_poscar, read_structure, render_incar, write_poscar, CrystalStructure, Element,
    Formula, KpointAccuracy, Kpoints, MaterialsDatabase, MaterialsProjectClient,
    PoscarCoordinates, StructureFormat, VaspInputSet,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn el(symbol: &str) -> Element {
    Element::from_symbol(symbol).unwrap()
}

// ---------------------------------------------------------------------------
// POSCAR coordinates
// ---------------------------------------------------------------------------

#[test]
fn test_direct_cartesian_direct_roundtrip() {
    let original = bulk(el("Mg"), CrystalStructure::Hcp, 3.21, Some(5.21)).unwrap();
    let direct = write_poscar(&original, PoscarCoordinates::Direct);

    let cart = write_poscar(
        &read_poscar(&direct).unwrap().structure,
        PoscarCoordinates::Cartesian,
    );
    let back = read_poscar(&cart).unwrap();
    let again = read_poscar(&write_poscar(&back.structure, PoscarCoordinates::Direct)).unwrap();

    for (a, b) in original.sites().iter().zip(again.structure.sites()) {
        assert_eq!(a.species, b.species);
        for i in 0..3 {
            assert!((a.frac_coords[i] - b.frac_coords[i]).abs() < 1e-9);
        }
    }
}

// ---------------------------------------------------------------------------
// Format conversion via files
// ---------------------------------------------------------------------------

#[test]
fn test_read_structure_from_disk_in_each_format() {
    let dir = tempfile::tempdir().unwrap();
    let s = bulk(el("Si"), CrystalStructure::Diamond, 5.43, None).unwrap();

    for format in [StructureFormat::Poscar, StructureFormat::Cif, StructureFormat::Xyz] {
        let file = dir.path().join(format.output_file_name(&dir.path().join("si")));
        std::fs::write(&file, format.render(&s)).unwrap();
        let back = read_structure(&file, format).unwrap();
        assert_eq!(back.num_sites(), 2, "{format}");
        assert!((back.lattice().volume().abs() - s.lattice().volume().abs()).abs() < 1e-5);
    }
}

#[test]
fn test_read_structure_missing_file() {
    let err = read_structure(std::path::Path::new("/nonexistent/POSCAR"), StructureFormat::Poscar)
        .unwrap_err();
    assert!(err.to_string().contains("cannot read"));
}

// ---------------------------------------------------------------------------
// Input presets
// ---------------------------------------------------------------------------

#[test]
fn test_every_preset_renders() {
    let s = bulk(el("Fe"), CrystalStructure::Bcc, 2.87, None).unwrap();
    for name in VaspInputSet::NAMES {
        let set: VaspInputSet = name.parse().unwrap();
        let incar = render_incar(&set.incar(&s));
        assert!(incar.contains("ENCUT = "), "{name}");
        assert!(!set.kpoints(&s).render().is_empty());
        assert_eq!(set.potcar_symbols(&s), vec!["Fe_pv".to_string()]);
    }
}

#[test]
fn test_accuracy_tiers_are_monotonic() {
    let s = bulk(el("Al"), CrystalStructure::Fcc, 4.05, None).unwrap();
    let grids: Vec<u32> = [KpointAccuracy::Low, KpointAccuracy::Medium, KpointAccuracy::High]
        .into_iter()
        .map(|acc| Kpoints::for_accuracy(&s, acc).divisions.iter().product())
        .collect();
    assert!(grids[0] <= grids[1] && grids[1] <= grids[2]);
}

// ---------------------------------------------------------------------------
// Materials Project client
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_materials_project_picks_most_stable_entry() {
    let server = MockServer::start().await;
    let site = |el: &str, abc: [f64; 3]| serde_json::json!({"species": [{"element": el}], "abc": abc});
    let lattice = serde_json::json!({"matrix": [[4.0, 0.0, 0.0], [0.0, 4.0, 0.0], [0.0, 0.0, 4.0]]});
    Mock::given(method("GET"))
        .and(path("/materials/summary/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [
                {"material_id": "mp-2", "energy_above_hull": 0.12,
                 "structure": {"lattice": lattice, "sites": [site("Cs", [0.0, 0.0, 0.0])]}},
                {"material_id": "mp-1", "energy_above_hull": 0.0,
                 "structure": {"lattice": lattice, "sites": [site("Cs", [0.0, 0.0, 0.0]), site("Cl", [0.5, 0.5, 0.5])]}}
            ]
        })))
        .mount(&server)
        .await;

    let client = MaterialsProjectClient::new(format!("{}/", server.uri()), "key");
    let found = client.best_match(&Formula::parse("CsCl").unwrap()).await.unwrap();
    assert_eq!(found.material_id, "mp-1");
    assert_eq!(found.structure.composition_formula(), "Cs1Cl1");
}
