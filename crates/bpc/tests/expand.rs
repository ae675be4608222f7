//! Blueprint to deployment directory
//!
//! Module sources are real directories so the hcl module reader is exercised as well.

use bpc::blueprint::Blueprint;
use bpc::config::ExpandConfig;
use bpc::error::ExpandError;
use bpc::overrides::ValidationLevel;
use bpc::reader::HclModuleReader;
use bpc::value::Value;
use pretty_assertions::assert_eq;
use std::path::Path;

const NETWORK_TF: &str = r#"
variable "project_id" {
  type = string
}

variable "region" {
  type = string
}

output "network_name" {
  value = "network"
}

output "subnetwork_name" {
  value = "subnetwork"
}
"#;

const IMAGE_PKR: &str = r#"
variable "project_id" {
  type = string
}

variable "subnetwork_name" {
  type = string
}

variable "disk_size" {
  type    = number
  default = 20
}
"#;

const COMPUTE_TF: &str = r#"
variable "project_id" {
  type = string
}

variable "network_name" {
  type = string
}

variable "machine_type" {
  type    = string
  default = "n2-standard-2"
}
"#;

fn blueprint(modules: &Path) -> String {
    let modules = modules.display();
    format!(
        r#"
blueprint_name: hpc
vars:
  project_id: test-project
  region: us-east1
terraform_backend_defaults:
  type: gcs
  configuration:
    bucket: ((var.project_id))-tf-state
deployment_groups:
- group: primary
  modules:
  - id: network
    source: {modules}/network
- group: images
  modules:
  - id: image
    source: {modules}/image
    kind: packer
    use: [network]
    settings:
      disk_size: 50
- group: cluster
  modules:
  - id: compute
    source: {modules}/compute
    settings:
      network_name: ((network.network_name))
"#
    )
}

fn setup() -> (tempfile::TempDir, Blueprint) {
    let dir = tempfile::tempdir().expect("tempdir");
    let modules = dir.path().join("modules");
    for (module, file, contents) in [
        ("network", "main.tf", NETWORK_TF),
        ("image", "image.pkr.hcl", IMAGE_PKR),
        ("compute", "main.tf", COMPUTE_TF),
    ] {
        std::fs::create_dir_all(modules.join(module)).expect("module dir");
        std::fs::write(modules.join(module).join(file), contents).expect("module file");
    }

    let blueprint = Blueprint::from_yaml_str(&blueprint(&modules)).expect("valid blueprint");
    (dir, blueprint)
}

#[test]
fn expands_and_writes_deployment() {
    let (dir, blueprint) = setup();

    let expanded = blueprint
        .expand(&ExpandConfig::default(), &HclModuleReader)
        .expect("valid blueprint");

    let primary = expanded.group("primary").expect("group exists");
    let network = &primary.modules[0];
    assert_eq!(network.settings.pure["project_id"], Value::from("test-project"));
    assert_eq!(network.settings.pure["region"], Value::from("us-east1"));
    assert_eq!(
        primary
            .exports
            .iter()
            .map(|output| output.automatic_name())
            .collect::<Vec<_>>(),
        vec!["subnetwork_name_network_7", "network_name_network_7"]
    );

    let image = &expanded.group("images").expect("group exists").modules[0];
    assert!(image.has_intergroup_dependency());
    assert_eq!(image.settings.pure["disk_size"], Value::Integer(50));
    assert!(image.settings.impure.contains_key("subnetwork_name"));
    assert!(!image.settings.impure.contains_key("network_name"));

    let backend = primary.backend.as_ref().expect("default backend");
    assert_eq!(
        backend.configuration["bucket"],
        Value::from("((var.project_id))-tf-state")
    );

    let deploy_dir = dir.path().join("deployment");
    let mut instructions = vec![];
    bpc::writer::write_deployment(&expanded, &deploy_dir, &mut instructions).expect("written");

    assert!(deploy_dir.join("primary/main.tf").is_file());
    assert!(deploy_dir.join("primary/outputs.tf").is_file());
    assert!(!deploy_dir.join("primary/variables.tf").exists());
    assert!(deploy_dir.join("images/image/image.pkr.hcl").is_file());
    assert!(deploy_dir.join("images/image/defaults.auto.pkrvars.hcl").is_file());
    assert!(deploy_dir.join("cluster/variables.tf").is_file());
    assert!(deploy_dir.join("primary/modules/network/main.tf").is_file());
    assert!(deploy_dir.join("cluster/modules/compute/main.tf").is_file());

    let cluster_main =
        std::fs::read_to_string(deploy_dir.join("cluster/main.tf")).expect("main.tf written");
    let cluster_main = hcl::parse(&cluster_main).expect("valid hcl");
    let compute = cluster_main
        .blocks()
        .find(|block| block.identifier() == "module")
        .expect("module block");
    let source = compute
        .body()
        .attributes()
        .find(|attribute| attribute.key() == "source")
        .expect("source attribute");
    assert_eq!(
        source.expr(),
        &hcl::Expression::String("./modules/compute".into())
    );

    let instructions = String::from_utf8(instructions).expect("utf-8");
    assert!(instructions.contains("Terraform group 'primary'"));
    assert!(instructions.contains("Packer group 'images'"));
    assert!(instructions.contains(&format!(
        "packer build -var \"subnetwork_name=$(terraform -chdir={} output -raw subnetwork_name_network_7)\" .",
        deploy_dir.join("primary").display()
    )));
    assert!(instructions.contains("Terraform group 'cluster'"));
}

#[test]
fn command_line_overrides_apply() {
    let (_dir, blueprint) = setup();

    let config = ExpandConfig::default()
        .with_cli_variables(["region=europe-west4"])
        .with_backend_config(["type=local", "path=state.tfstate"]);
    let expanded = blueprint
        .expand(&config, &HclModuleReader)
        .expect("valid blueprint");

    let primary = &expanded.groups()[0];
    assert_eq!(
        primary.modules[0].settings.pure["region"],
        Value::from("europe-west4")
    );
    let backend = primary.backend.as_ref().expect("backend");
    assert_eq!(backend.backend_type, "local");
    assert_eq!(backend.configuration["path"], Value::from("state.tfstate"));

    assert_eq!(blueprint.vars["region"], "us-east1");
}

#[test]
fn validation_level_gates_unknown_settings() {
    let (_dir, mut blueprint) = setup();
    blueprint.deployment_groups[2].modules[0]
        .settings
        .insert("not_an_input".into(), "value".into());

    let err = blueprint
        .expand(&ExpandConfig::default(), &HclModuleReader)
        .expect_err("unknown setting");
    assert!(matches!(err, ExpandError::InvalidSetting { .. }));

    let config = ExpandConfig::default().with_validation_level(ValidationLevel::Warning);
    assert!(blueprint.expand(&config, &HclModuleReader).is_ok());
}

#[test]
fn expanded_blueprint_serializes() {
    let (_dir, blueprint) = setup();
    let expanded = blueprint
        .expand(&ExpandConfig::default(), &HclModuleReader)
        .expect("valid blueprint");

    let json = serde_json::to_value(&expanded).expect("serializable");
    assert_eq!(json["name"], "hpc");
    assert_eq!(json["validation_level"], "ERROR");
    assert_eq!(
        json["groups"][2]["modules"][0]["impure"]["network_name"],
        "var.network_name_network_7"
    );
}
