use std::process::Stdio;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::core::domain::{ResourceKind, ResourceSnapshot};

#[derive(Debug, Error)]
pub enum KubectlError {
    #[error("'{bin}' başlatılamadı: {source}")]
    Spawn {
        bin: String,
        #[source]
        source: std::io::Error,
    },
    #[error("komut {limit:?} sınırını aştı, süreç sonlandırıldı")]
    Timeout { limit: Duration },
    #[error("kontrol düzlemi çıktısı JSON olarak çözümlenemedi: {source}")]
    Parse {
        #[source]
        source: serde_json::Error,
    },
    #[error("kontrol düzlemi komutu reddetti (kod {exit_code}): {detail}")]
    CommandFailed { exit_code: i32, detail: String },
}

#[derive(Debug, Clone)]
pub struct CommandOutcome {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub parsed: Option<Value>,
}

impl CommandOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Kontrol düzlemi CLI'ı için ince istemci. Komutlar her zaman argüman
/// dizisiyle kurulur, kabuk üzerinden asla geçmez.
#[derive(Clone)]
pub struct KubectlClient {
    bin: String,
    query_timeout: Duration,
    action_timeout: Duration,
}

impl KubectlClient {
    pub fn new(bin: &str, query_timeout_secs: u64, action_timeout_secs: u64) -> Self {
        Self {
            bin: bin.to_string(),
            query_timeout: Duration::from_secs(query_timeout_secs),
            action_timeout: Duration::from_secs(action_timeout_secs),
        }
    }

    /// Tek komut çalıştırır; sıfır dışı çıkış kodu normal bir sonuçtur,
    /// hata değildir. Süre sınırı aşılırsa süreç öldürülür.
    pub async fn run(&self, args: &[&str], limit: Duration) -> Result<CommandOutcome, KubectlError> {
        debug!(event = "KUBECTL_EXEC", bin = %self.bin, args = ?args, "Kontrol düzlemi komutu çalıştırılıyor");

        let mut cmd = Command::new(&self.bin);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match timeout(limit, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(source)) => {
                return Err(KubectlError::Spawn { bin: self.bin.clone(), source });
            }
            Err(_) => {
                warn!(event = "KUBECTL_TIMEOUT", args = ?args, limit = ?limit, "Komut zaman aşımına uğradı, süreç öldürüldü");
                return Err(KubectlError::Timeout { limit });
            }
        };

        let outcome = CommandOutcome {
            // Sinyalle ölen süreç için kod yoktur, -1 kullanılır.
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            parsed: None,
        };

        if !outcome.success() {
            debug!(
                event = "KUBECTL_NONZERO_EXIT",
                code = outcome.exit_code,
                stderr = %outcome.stderr.trim(),
                "Komut sıfır dışı kodla bitti"
            );
        }

        Ok(outcome)
    }

    /// `run` gibi; çıkış kodu sıfırsa stdout JSON olarak çözümlenir.
    /// Bozuk JSON, komut reddinden ayrı bir hata olarak döner.
    pub async fn run_json(&self, args: &[&str], limit: Duration) -> Result<CommandOutcome, KubectlError> {
        let mut outcome = self.run(args, limit).await?;
        if outcome.success() {
            let parsed = serde_json::from_str(&outcome.stdout)
                .map_err(|source| KubectlError::Parse { source })?;
            outcome.parsed = Some(parsed);
        }
        Ok(outcome)
    }

    /// Tek kategori sorgusu. Asla hata fırlatmaz; her başarısızlık
    /// kategoriye gömülü bir hata kaydına dönüşür.
    pub async fn fetch(&self, kind: ResourceKind) -> ResourceSnapshot {
        let mut args = vec!["get", kind.plural()];
        if kind.namespaced() {
            args.push("--all-namespaces");
        }
        args.extend(["-o", "json"]);

        match self.run_json(&args, self.query_timeout).await {
            Ok(outcome) if outcome.success() => {
                let items = outcome
                    .parsed
                    .and_then(|mut v| v.get_mut("items").and_then(Value::as_array_mut).map(std::mem::take))
                    .unwrap_or_default();
                ResourceSnapshot::ready(kind, items)
            }
            Ok(outcome) => {
                let detail = if outcome.stderr.trim().is_empty() {
                    format!("çıkış kodu {}", outcome.exit_code)
                } else {
                    outcome.stderr.trim().to_string()
                };
                warn!(event = "RESOURCE_FETCH_FAILED", category = %kind, exit_code = outcome.exit_code, "Kategori sorgusu reddedildi");
                ResourceSnapshot::failed(kind, detail)
            }
            Err(e) => {
                warn!(event = "RESOURCE_FETCH_FAILED", category = %kind, error = %e, "Kategori sorgusu tamamlanamadı");
                ResourceSnapshot::failed(kind, e.to_string())
            }
        }
    }

    pub async fn delete_pod(&self, namespace: &str, name: &str) -> Result<String, KubectlError> {
        let outcome = self
            .run(&["delete", "pod", name, "-n", namespace], self.action_timeout)
            .await?;
        Self::confirm(outcome, format!("pod {} silindi", name))
    }

    pub async fn rollout_restart_deployment(&self, namespace: &str, name: &str) -> Result<String, KubectlError> {
        let outcome = self
            .run(&["rollout", "restart", "deployment", name, "-n", namespace], self.action_timeout)
            .await?;
        Self::confirm(outcome, format!("deployment {} yeniden başlatıldı", name))
    }

    /// `app=<name>` etiketiyle eşleşen deployment adlarını çözer.
    pub async fn deployments_for_app(&self, namespace: &str, app: &str) -> Result<Vec<String>, KubectlError> {
        let selector = format!("app={}", app);
        let outcome = self
            .run_json(
                &["get", "deployment", "-n", namespace, "-l", &selector, "-o", "json"],
                self.query_timeout,
            )
            .await?;
        if !outcome.success() {
            return Err(KubectlError::CommandFailed {
                exit_code: outcome.exit_code,
                detail: outcome.stderr.trim().to_string(),
            });
        }

        let names = outcome
            .parsed
            .as_ref()
            .and_then(|v| v.get("items"))
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.pointer("/metadata/name"))
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Ok(names)
    }

    fn confirm(outcome: CommandOutcome, fallback: String) -> Result<String, KubectlError> {
        if outcome.success() {
            let msg = outcome.stdout.trim();
            Ok(if msg.is_empty() { fallback } else { msg.to_string() })
        } else {
            let detail = if outcome.stderr.trim().is_empty() {
                outcome.stdout.trim().to_string()
            } else {
                outcome.stderr.trim().to_string()
            };
            Err(KubectlError::CommandFailed { exit_code: outcome.exit_code, detail })
        }
    }
}
