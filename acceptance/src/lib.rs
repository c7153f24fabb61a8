/*!

Shared pieces of the gateway chart acceptance suite: suite-properties
location, logging setup, and the deployment expectations every scenario
checks after an install or upgrade.

The scenarios themselves live under `tests/`: stub-CLI tests that exercise
the harness end to end without a cluster, and `#[ignore]`d live-cluster
scenarios driven by `suiteProperties.json`.

!*/

use chart_harness::ExpectationSet;
use std::path::PathBuf;
use std::sync::Once;

/// The chart under test.
pub const CHART_NAME: &str = "osgw";

static INIT_LOGGING: Once = Once::new();

/// Initializes `env_logger` once for the whole test binary. Controlled with
/// `RUST_LOG` as usual.
pub fn init_logging() {
    INIT_LOGGING.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

/// Where to find the suite properties file. Overridable with
/// `ACCEPTANCE_PROPERTIES` so CI can point suites at a generated file.
pub fn properties_path() -> PathBuf {
    std::env::var("ACCEPTANCE_PROPERTIES")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("suiteProperties.json"))
}

/// The deployment fields every installed release must carry: its own
/// metadata, the lifecycle tool's bookkeeping annotations, the standard
/// app labels, and the chart's fixed spec values.
pub fn deployment_expectations(
    release: &str,
    namespace: &str,
    chart_version: &str,
    revision: &str,
) -> ExpectationSet {
    ExpectationSet::new()
        .field("/metadata/name", release)
        .field("/metadata/namespace", namespace)
        .field(
            "/metadata/annotations/deployment.kubernetes.io~1revision",
            revision,
        )
        .field("/metadata/annotations/meta.helm.sh~1release-name", release)
        .field(
            "/metadata/annotations/meta.helm.sh~1release-namespace",
            namespace,
        )
        .field("/metadata/labels/app.kubernetes.io~1instance", release)
        .field("/metadata/labels/app.kubernetes.io~1managed-by", "Helm")
        .field("/metadata/labels/app.kubernetes.io~1name", CHART_NAME)
        .field(
            "/metadata/labels/helm.sh~1chart",
            format!("{}-{}", CHART_NAME, chart_version).as_str(),
        )
        .field("/spec/replicas", 1)
        .field(
            "/spec/selector/matchLabels/app.kubernetes.io~1component",
            "gateway",
        )
        .field(
            "/spec/selector/matchLabels/app.kubernetes.io~1instance",
            release,
        )
        .field(
            "/spec/selector/matchLabels/app.kubernetes.io~1name",
            CHART_NAME,
        )
        .field("/spec/strategy/type", "Recreate")
        .field(
            "/spec/template/metadata/labels/app.kubernetes.io~1component",
            "gateway",
        )
        .field(
            "/spec/template/metadata/labels/app.kubernetes.io~1instance",
            release,
        )
        .field(
            "/spec/template/metadata/labels/app.kubernetes.io~1name",
            CHART_NAME,
        )
}

/// The container fields pinned by the chart for the gateway container.
pub fn gateway_container_expectations(
    release: &str,
    namespace: &str,
    system_domain: &str,
    image: &str,
) -> ExpectationSet {
    let container = "/spec/template/spec/containers/0";
    let public_dns = format!("{}-{}.{}", release, namespace, system_domain);
    let private_dns = format!("{}-{}.{}.svc.cluster.local", release, namespace, namespace);
    ExpectationSet::new()
        .field(format!("{}/name", container), release)
        .field(format!("{}/image", container), image)
        .field(format!("{}/imagePullPolicy", container), "IfNotPresent")
        .field(format!("{}/args/0", container), "--dns-name")
        .field(
            format!("{}/args/1", container),
            format!("{}, {}", public_dns, private_dns).as_str(),
        )
        .field(
            format!("{}/envFrom/0/secretRef/name", container),
            format!("{}-{}-creds", release, namespace).as_str(),
        )
        .field(format!("{}/ports/0/containerPort", container), 7480)
        .field(format!("{}/ports/0/name", container), "s3")
        .field(format!("{}/ports/0/protocol", container), "TCP")
        .field(format!("{}/ports/1/containerPort", container), 7481)
        .field(format!("{}/ports/1/name", container), "s3-tls")
        .field(format!("{}/ports/1/protocol", container), "TCP")
        .field(format!("{}/volumeMounts/0/mountPath", container), "/data")
        .field(format!("{}/volumeMounts/0/name", container), "gateway-store")
        .field(
            format!("{}/volumeMounts/1/mountPath", container),
            "/cluster-ip-tls",
        )
        .field(
            format!("{}/volumeMounts/1/name", container),
            "cluster-ip-tls",
        )
}

/// The volumes backing the gateway pod template.
pub fn gateway_volume_expectations(release: &str, namespace: &str) -> ExpectationSet {
    let volumes = "/spec/template/spec/volumes";
    ExpectationSet::new()
        .field(format!("{}/0/name", volumes), "gateway-store")
        .field(
            format!("{}/0/persistentVolumeClaim/claimName", volumes),
            format!("{}-pvc", release).as_str(),
        )
        .field(format!("{}/1/name", volumes), "cluster-ip-tls")
        .field(
            format!("{}/1/secret/secretName", volumes),
            format!("{}-{}-cluster-ip-tls", release, namespace).as_str(),
        )
}

#[cfg(test)]
mod test_expectation_builders {
    use super::*;
    use chart_harness::expect;
    use serde_json::json;

    #[test]
    fn deployment_expectations_accept_a_conforming_document() {
        let doc = json!({
            "metadata": {
                "name": "gw-1",
                "namespace": "gw-ns-1",
                "annotations": {
                    "deployment.kubernetes.io/revision": "1",
                    "meta.helm.sh/release-name": "gw-1",
                    "meta.helm.sh/release-namespace": "gw-ns-1"
                },
                "labels": {
                    "app.kubernetes.io/instance": "gw-1",
                    "app.kubernetes.io/managed-by": "Helm",
                    "app.kubernetes.io/name": CHART_NAME,
                    "helm.sh/chart": format!("{}-0.24.0", CHART_NAME)
                }
            },
            "spec": {
                "replicas": 1,
                "selector": {"matchLabels": {
                    "app.kubernetes.io/component": "gateway",
                    "app.kubernetes.io/instance": "gw-1",
                    "app.kubernetes.io/name": CHART_NAME
                }},
                "strategy": {"type": "Recreate"},
                "template": {"metadata": {"labels": {
                    "app.kubernetes.io/component": "gateway",
                    "app.kubernetes.io/instance": "gw-1",
                    "app.kubernetes.io/name": CHART_NAME
                }}}
            }
        });
        let set = deployment_expectations("gw-1", "gw-ns-1", "0.24.0", "1");
        expect::expect(&doc, &set).unwrap();
    }

    #[test]
    fn deployment_expectations_catch_a_wrong_revision() {
        let doc = json!({
            "metadata": {
                "name": "gw-1",
                "namespace": "gw-ns-1",
                "annotations": {"deployment.kubernetes.io/revision": "1"}
            }
        });
        let err = expect::expect(&doc, &deployment_expectations("gw-1", "gw-ns-1", "0.24.0", "2"))
            .unwrap_err();
        assert!(err.path.ends_with("deployment.kubernetes.io~1revision"));
        assert_eq!(err.actual, "\"1\"");
    }
}
