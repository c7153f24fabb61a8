/*!

Live-cluster install scenario: install the gateway chart into a fresh
namespace, assert the deployment's static values, then tear down. Needs a
reachable cluster, the charts checkout, and `suiteProperties.json`; run with
`cargo test -- --ignored`.

!*/

use chart_acceptance::{
    deployment_expectations, gateway_container_expectations, gateway_volume_expectations,
    init_logging, properties_path,
};
use chart_harness::{helm, kubectl, unique_name, DeploymentRequest, SuiteProperties, Tools};

#[test]
#[ignore = "requires a live cluster and the charts checkout"]
fn installed_deployment_has_expected_static_values() {
    init_logging();
    let properties = SuiteProperties::from_file(properties_path())
        .expect("suite properties are required for acceptance runs");

    let generated_release = unique_name("osgw");
    let generated_namespace = unique_name("osgw-acceptance");
    let release = properties.release_or(&generated_release).to_string();
    let namespace = properties.namespace_or(&generated_namespace).to_string();

    let tools = Tools::new();
    let mut request = DeploymentRequest::new(&release, &namespace, &properties.charts_root)
        .set("publicDomain", &properties.system_domain)
        .set("ui.publicDomain", &properties.system_domain)
        .set("imageTag", &format!("v{}", properties.image_tag))
        .set("ui.imageTag", &format!("v{}", properties.image_tag))
        .extra_args(properties.extra_args());
    if !properties.charts_ver.is_empty() {
        request = request.version(&properties.charts_ver);
    }

    helm::install(&tools, &request).expect("chart installation failed");

    let scenario = (|| -> Result<(), Box<dyn std::error::Error>> {
        let observed = kubectl::query(&tools, "deployments", Some(&namespace), &release)?;
        observed.check(&deployment_expectations(
            &release,
            &namespace,
            &properties.charts_ver,
            "1",
        ))?;
        observed.check(&gateway_container_expectations(
            &release,
            &namespace,
            &properties.system_domain,
            &format!("{}:v{}", properties.image_name, properties.image_tag),
        ))?;
        observed.check(&gateway_volume_expectations(&release, &namespace))?;
        Ok(())
    })();

    // Teardown always runs; a teardown failure must not mask the scenario's.
    let teardown = helm::uninstall(&tools, &request);
    scenario.expect("install scenario failed");
    teardown.expect("teardown failed");
}
