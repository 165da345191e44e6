use bodega::fetch::location::LocationSpec;
use bodega::graph::constraint::Constraint;
use bodega::inventory::Inventory;
use semver::Version;
use std::path::Path;

fn v(s: &str) -> Version {
    Version::parse(s).unwrap()
}

#[test]
fn parses_sources_and_version_requirements() {
    let yaml = r#"
sources:
  - https://supermarket.chef.io/api/v1
  - https://mirror.internal/api/v1

cookbooks:
  nginx:
    versions:
      - "~> 2.7"
  mysql: {}
"#;
    let inventory = Inventory::parse(yaml, Path::new(".")).unwrap();
    assert_eq!(
        inventory.sources,
        vec![
            "https://supermarket.chef.io/api/v1".to_string(),
            "https://mirror.internal/api/v1".to_string()
        ]
    );

    let reqs: Vec<_> = inventory.requirements.iter().collect();
    assert_eq!(reqs.len(), 2);

    let mysql = reqs.iter().find(|r| r.name == "mysql").unwrap();
    assert!(mysql.constraints.is_empty());
    assert!(mysql.location.is_none());

    let nginx = reqs.iter().find(|r| r.name == "nginx").unwrap();
    assert_eq!(nginx.constraints, vec![Constraint::parse("~> 2.7").unwrap()]);
}

#[test]
fn parses_git_location_with_ref() {
    let yaml = r#"
cookbooks:
  internal_base:
    git:
      location: https://example.com/internal_base.git
      ref: v1.2.0
"#;
    let inventory = Inventory::parse(yaml, Path::new(".")).unwrap();
    let req = inventory.requirements.iter().next().unwrap();
    assert_eq!(
        req.location,
        Some(LocationSpec::Git {
            url: "https://example.com/internal_base.git".to_string(),
            reference: Some("v1.2.0".to_string()),
        })
    );
}

#[test]
fn branch_and_tag_are_ref_aliases() {
    let yaml = r#"
cookbooks:
  a:
    git:
      location: https://example.com/a.git
      branch: develop
"#;
    let inventory = Inventory::parse(yaml, Path::new(".")).unwrap();
    let req = inventory.requirements.iter().next().unwrap();
    match &req.location {
        Some(LocationSpec::Git { reference, .. }) => {
            assert_eq!(reference.as_deref(), Some("develop"));
        }
        other => panic!("expected git location, got {other:?}"),
    }
}

#[test]
fn relative_path_locations_resolve_against_inventory_dir() {
    let yaml = r#"
cookbooks:
  local_tweaks:
    path:
      location: ./cookbooks/local_tweaks
"#;
    let inventory = Inventory::parse(yaml, Path::new("/etc/bodega")).unwrap();
    let req = inventory.requirements.iter().next().unwrap();
    match &req.location {
        Some(LocationSpec::Path { path }) => {
            assert_eq!(path, Path::new("/etc/bodega/cookbooks/local_tweaks"));
        }
        other => panic!("expected path location, got {other:?}"),
    }
}

#[test]
fn rejects_requirement_with_two_locations() {
    let yaml = r#"
cookbooks:
  confused:
    git:
      location: https://example.com/confused.git
    path:
      location: ./confused
"#;
    assert!(Inventory::parse(yaml, Path::new(".")).is_err());
}

#[test]
fn rejects_bad_constraint() {
    let yaml = r#"
cookbooks:
  broken:
    versions:
      - "not a constraint"
"#;
    assert!(Inventory::parse(yaml, Path::new(".")).is_err());
}

#[test]
fn version_required_checks_explicit_requirements_only() {
    let yaml = r#"
cookbooks:
  pinned:
    versions:
      - "= 1.0.0"
"#;
    let inventory = Inventory::parse(yaml, Path::new(".")).unwrap();
    let reqs = inventory.requirements;

    assert!(reqs.version_required("pinned", &v("1.0.0")));
    assert!(!reqs.version_required("pinned", &v("2.0.0")));
    // Names the inventory never mentions are unconstrained.
    assert!(reqs.version_required("transitive_only", &v("9.9.9")));
}
