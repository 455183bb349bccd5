use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use crate::adapters::kubectl::{KubectlClient, KubectlError};
use crate::core::domain::{ActionCode, ActionRequest, ActionResult};

lazy_static! {
    // RFC 1123 alt alan adı deseni; namespace ve name bununla sınırlanır.
    static ref SAFE_IDENT: Regex = Regex::new(r"^[a-z0-9]([-a-z0-9.]*[a-z0-9])?$").unwrap();
}

const MAX_IDENT_LEN: usize = 253;

pub struct ActionDispatcher {
    kubectl: KubectlClient,
}

impl ActionDispatcher {
    pub fn new(kubectl: KubectlClient) -> Self {
        Self { kubectl }
    }

    /// İsteği doğrular, politika tablosuna göre komuta çevirir ve sonucu
    /// her zaman değer olarak döner; asla hata fırlatmaz.
    pub async fn dispatch(&self, req: &ActionRequest) -> ActionResult {
        if let Err(detail) = validate(req) {
            warn!("⛔ Geçersiz eylem isteği: {}", detail);
            return ActionResult::failure(ActionCode::ValidationError, detail);
        }

        info!("🎯 [DISPATCH] Eylem isteği: {} {}/{}", req.resource_type, req.namespace, req.name);

        let outcome = match req.resource_type.as_str() {
            "pod" => self.kubectl.delete_pod(&req.namespace, &req.name).await,
            "deployment" => {
                self.kubectl.rollout_restart_deployment(&req.namespace, &req.name).await
            }
            "service" => return self.restart_service(req).await,
            other => {
                warn!("⛔ Desteklenmeyen kaynak türü, komut kurulmadı: {}", other);
                return ActionResult::failure(
                    ActionCode::UnsupportedType,
                    format!("desteklenmeyen kaynak türü: {}", other),
                );
            }
        };

        finish(req, outcome)
    }

    /// Servis yeniden başlatma: önce `app=<name>` etiketiyle deployment'lar
    /// çözülür, boş sonuç asla komuta dönüşmez.
    async fn restart_service(&self, req: &ActionRequest) -> ActionResult {
        let targets = match self.kubectl.deployments_for_app(&req.namespace, &req.name).await {
            Ok(targets) => targets,
            Err(e) => {
                warn!("❌ Etiket çözümü başarısız ({}/{}): {}", req.namespace, req.name, e);
                return failure_from(e);
            }
        };

        if targets.is_empty() {
            warn!("🔍 Eşleşme yok: {} içinde app={} deployment'ı bulunamadı", req.namespace, req.name);
            return ActionResult::failure(
                ActionCode::NotFound,
                format!("{} namespace'inde app={} etiketiyle deployment bulunamadı", req.namespace, req.name),
            );
        }

        let mut confirmations = Vec::with_capacity(targets.len());
        for target in &targets {
            match self.kubectl.rollout_restart_deployment(&req.namespace, target).await {
                Ok(msg) => confirmations.push(msg),
                Err(e) => {
                    warn!("❌ {} yeniden başlatılamadı: {}", target, e);
                    return failure_from(e);
                }
            }
        }

        info!("✅ Servis eylemi tamamlandı: {} hedef yeniden başlatıldı", targets.len());
        ActionResult::success(confirmations.join("; "))
    }
}

fn finish(req: &ActionRequest, outcome: Result<String, KubectlError>) -> ActionResult {
    match outcome {
        Ok(message) => {
            info!("✅ Eylem tamamlandı ({} {}/{}): {}", req.resource_type, req.namespace, req.name, message);
            ActionResult::success(message)
        }
        Err(e) => {
            warn!("❌ Eylem başarısız ({} {}/{}): {}", req.resource_type, req.namespace, req.name, e);
            failure_from(e)
        }
    }
}

fn failure_from(e: KubectlError) -> ActionResult {
    let code = match &e {
        KubectlError::Timeout { .. } => ActionCode::Timeout,
        KubectlError::Parse { .. } => ActionCode::ParseError,
        KubectlError::CommandFailed { .. } | KubectlError::Spawn { .. } => ActionCode::CommandFailed,
    };
    ActionResult::failure(code, e.to_string())
}

fn validate(req: &ActionRequest) -> Result<(), String> {
    for (field, value) in [
        ("type", &req.resource_type),
        ("namespace", &req.namespace),
        ("name", &req.name),
    ] {
        if value.trim().is_empty() {
            return Err(format!("'{}' alanı boş olamaz", field));
        }
    }

    for (field, value) in [("namespace", &req.namespace), ("name", &req.name)] {
        if value.len() > MAX_IDENT_LEN || !SAFE_IDENT.is_match(value) {
            return Err(format!("'{}' alanı güvenli tanımlayıcı desenine uymuyor", field));
        }
    }

    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::test_support::fake_kubectl;
    use tempfile::TempDir;

    // Her çağrıyı satır satır kaydeden ve etiket sorgularına sabit yanıt
    // veren sahte kubectl.
    fn logging_kubectl(dir: &TempDir, lookup_json: &str) -> (ActionDispatcher, std::path::PathBuf) {
        let log = dir.path().join("calls.log");
        let body = r#"
echo "$@" >> "__LOG__"
case "$*" in
  *" -l app="*) echo '__LOOKUP__' ;;
  *) echo islem tamam ;;
esac
"#
        .replace("__LOG__", &log.to_string_lossy())
        .replace("__LOOKUP__", lookup_json);
        let bin = fake_kubectl(dir, &body);
        (ActionDispatcher::new(KubectlClient::new(&bin, 2, 2)), log)
    }

    fn calls(log: &std::path::Path) -> Vec<String> {
        match std::fs::read_to_string(log) {
            Ok(content) => content.lines().map(str::to_string).collect(),
            Err(_) => Vec::new(),
        }
    }

    fn request(resource_type: &str, namespace: &str, name: &str) -> ActionRequest {
        ActionRequest {
            resource_type: resource_type.to_string(),
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn unknown_resource_type_never_reaches_the_control_plane() {
        let dir = TempDir::new().unwrap();
        let (dispatcher, log) = logging_kubectl(&dir, r#"{"items":[]}"#);

        let result = dispatcher.dispatch(&request("widget", "ns1", "x")).await;

        assert!(!result.ok);
        assert_eq!(result.code, Some(ActionCode::UnsupportedType));
        assert!(calls(&log).is_empty());
    }

    #[tokio::test]
    async fn blank_namespace_fails_validation_without_any_command() {
        let dir = TempDir::new().unwrap();
        let (dispatcher, log) = logging_kubectl(&dir, r#"{"items":[]}"#);

        let result = dispatcher.dispatch(&request("pod", "", "x")).await;

        assert!(!result.ok);
        assert_eq!(result.code, Some(ActionCode::ValidationError));
        assert!(calls(&log).is_empty());
    }

    #[tokio::test]
    async fn shell_metacharacters_are_rejected_by_the_identifier_pattern() {
        let dir = TempDir::new().unwrap();
        let (dispatcher, log) = logging_kubectl(&dir, r#"{"items":[]}"#);

        let result = dispatcher.dispatch(&request("pod", "ns1", "web; rm -rf /")).await;

        assert_eq!(result.code, Some(ActionCode::ValidationError));
        assert!(calls(&log).is_empty());
    }

    #[tokio::test]
    async fn service_with_no_matching_deployment_is_not_found() {
        let dir = TempDir::new().unwrap();
        let (dispatcher, log) = logging_kubectl(&dir, r#"{"items":[]}"#);

        let result = dispatcher.dispatch(&request("service", "ns1", "nomatch")).await;

        assert!(!result.ok);
        assert_eq!(result.code, Some(ActionCode::NotFound));
        // Yalnızca etiket sorgusu koşmuş olmalı, restart asla.
        let issued = calls(&log);
        assert_eq!(issued.len(), 1);
        assert!(issued[0].contains("-l app=nomatch"));
    }

    #[tokio::test]
    async fn service_restart_hits_every_resolved_deployment() {
        let dir = TempDir::new().unwrap();
        let (dispatcher, log) = logging_kubectl(
            &dir,
            r#"{"items":[{"metadata":{"name":"web-a"}},{"metadata":{"name":"web-b"}}]}"#,
        );

        let result = dispatcher.dispatch(&request("service", "ns1", "web")).await;

        assert!(result.ok, "beklenmeyen hata: {:?}", result.error);
        let issued = calls(&log);
        assert_eq!(issued.len(), 3);
        assert!(issued[1].contains("rollout restart deployment web-a"));
        assert!(issued[2].contains("rollout restart deployment web-b"));
    }

    #[tokio::test]
    async fn pod_delete_builds_the_expected_argv() {
        let dir = TempDir::new().unwrap();
        let (dispatcher, log) = logging_kubectl(&dir, r#"{"items":[]}"#);

        let result = dispatcher.dispatch(&request("pod", "ns1", "web-0")).await;

        assert!(result.ok);
        let issued = calls(&log);
        assert_eq!(issued, vec!["delete pod web-0 -n ns1".to_string()]);
    }

    #[tokio::test]
    async fn control_plane_refusal_maps_to_command_failed() {
        let dir = TempDir::new().unwrap();
        let bin = fake_kubectl(&dir, "echo 'deployments.apps \"x\" not found' >&2; exit 1");
        let dispatcher = ActionDispatcher::new(KubectlClient::new(&bin, 2, 2));

        let result = dispatcher.dispatch(&request("deployment", "ns1", "x")).await;

        assert!(!result.ok);
        assert_eq!(result.code, Some(ActionCode::CommandFailed));
        assert!(result.error.unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn hung_control_plane_maps_to_timeout() {
        let dir = TempDir::new().unwrap();
        let bin = fake_kubectl(&dir, "sleep 10");
        let dispatcher = ActionDispatcher::new(KubectlClient::new(&bin, 1, 1));

        let result = dispatcher.dispatch(&request("deployment", "ns1", "web")).await;

        assert!(!result.ok);
        assert_eq!(result.code, Some(ActionCode::Timeout));
    }

    #[test]
    fn identifier_pattern_accepts_dns_names_only() {
        assert!(SAFE_IDENT.is_match("web-app.v2"));
        assert!(SAFE_IDENT.is_match("a"));
        assert!(!SAFE_IDENT.is_match("-web"));
        assert!(!SAFE_IDENT.is_match("web-"));
        assert!(!SAFE_IDENT.is_match("Web"));
        assert!(!SAFE_IDENT.is_match("web app"));
        assert!(!SAFE_IDENT.is_match("$(ls)"));
    }
}
