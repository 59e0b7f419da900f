//! In-memory secret vault with Secrets Manager staging semantics.
//!
//! - A staging label is attached to at most one version per secret
//! - Moving `AWSCURRENT` away from a version gives that version `AWSPREVIOUS`
//! - Reading without a version or stage returns the `AWSCURRENT` version
//! - Re-putting an existing version with the same value is a no-op; a
//!   different value is rejected
//!
//! Failures can be injected per read stage, for every read, or for every
//! mutation. Call counters let tests assert that an operation did nothing.

use common::secret::{ExposeSecret, SecretString};
use common::vault::{
    SecretVault, SecretVersion, StageUpdate, VaultError, VersionSelector, STAGE_CURRENT,
    STAGE_PREVIOUS,
};
use async_trait::async_trait;
use rand::distributions::{Alphanumeric, Uniform};
use rand::Rng;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
struct StoredVersion {
    version_id: String,
    value: String,
    stages: Vec<String>,
}

#[derive(Debug, Default)]
struct Failures {
    by_stage: HashMap<String, VaultError>,
    all_reads: Option<VaultError>,
    mutations: Option<VaultError>,
    describe: Option<VaultError>,
}

/// In-memory [`SecretVault`] for tests.
#[derive(Default)]
pub struct InMemoryVault {
    secrets: Mutex<HashMap<String, Vec<StoredVersion>>>,
    failures: Mutex<Failures>,
    puts: AtomicUsize,
    stage_updates: AtomicUsize,
    passwords: AtomicUsize,
}

impl InMemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a version with the given labels (builder style).
    pub fn with_version(self, secret_id: &str, version_id: &str, value: &str, stages: &[&str]) -> Self {
        {
            let mut secrets = self.secrets.try_lock().expect("vault not shared yet");
            let versions = secrets.entry(secret_id.to_string()).or_default();
            for stage in stages {
                detach_label(versions, stage);
            }
            versions.push(StoredVersion {
                version_id: version_id.to_string(),
                value: value.to_string(),
                stages: stages.iter().map(|s| s.to_string()).collect(),
            });
        }
        self
    }

    /// Fail reads that select `stage`.
    pub async fn fail_reads_of_stage(&self, stage: &str, error: VaultError) {
        self.failures.lock().await.by_stage.insert(stage.to_string(), error);
    }

    /// Fail every read.
    pub async fn fail_all_reads(&self, error: VaultError) {
        self.failures.lock().await.all_reads = Some(error);
    }

    /// Fail every put and stage update.
    pub async fn fail_mutations(&self, error: VaultError) {
        self.failures.lock().await.mutations = Some(error);
    }

    /// Fail listing version stages.
    pub async fn fail_describe(&self, error: VaultError) {
        self.failures.lock().await.describe = Some(error);
    }

    /// Remove all injected failures.
    pub async fn clear_failures(&self) {
        *self.failures.lock().await = Failures::default();
    }

    /// Number of successful puts that created a version.
    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    /// Number of successful stage updates.
    pub fn stage_update_count(&self) -> usize {
        self.stage_updates.load(Ordering::SeqCst)
    }

    /// Number of passwords generated.
    pub fn password_count(&self) -> usize {
        self.passwords.load(Ordering::SeqCst)
    }

    /// Puts plus stage updates.
    pub fn mutation_count(&self) -> usize {
        self.put_count() + self.stage_update_count()
    }

    /// Labels attached to a version, sorted.
    pub async fn stages_of(&self, secret_id: &str, version_id: &str) -> Vec<String> {
        let secrets = self.secrets.lock().await;
        let mut stages = secrets
            .get(secret_id)
            .and_then(|versions| versions.iter().find(|v| v.version_id == version_id))
            .map(|v| v.stages.clone())
            .unwrap_or_default();
        stages.sort();
        stages
    }

    /// Stored value of a version.
    pub async fn value_of(&self, secret_id: &str, version_id: &str) -> Option<String> {
        let secrets = self.secrets.lock().await;
        secrets
            .get(secret_id)?
            .iter()
            .find(|v| v.version_id == version_id)
            .map(|v| v.value.clone())
    }

    /// Value of the version carrying `stage`.
    pub async fn value_in_stage(&self, secret_id: &str, stage: &str) -> Option<String> {
        let secrets = self.secrets.lock().await;
        secrets
            .get(secret_id)?
            .iter()
            .find(|v| v.stages.iter().any(|s| s == stage))
            .map(|v| v.value.clone())
    }

    async fn check_mutation(&self) -> Result<(), VaultError> {
        match &self.failures.lock().await.mutations {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

fn detach_label(versions: &mut [StoredVersion], stage: &str) {
    for version in versions.iter_mut() {
        version.stages.retain(|s| s != stage);
    }
}

fn attach_label(versions: &mut [StoredVersion], version_id: &str, stage: &str) {
    let previous_holder = versions
        .iter()
        .find(|v| v.version_id != version_id && v.stages.iter().any(|s| s == stage))
        .map(|v| v.version_id.clone());

    detach_label(versions, stage);

    if stage == STAGE_CURRENT {
        if let Some(previous) = previous_holder {
            detach_label(versions, STAGE_PREVIOUS);
            if let Some(v) = versions.iter_mut().find(|v| v.version_id == previous) {
                v.stages.push(STAGE_PREVIOUS.to_string());
            }
        }
    }

    if let Some(v) = versions.iter_mut().find(|v| v.version_id == version_id) {
        if !v.stages.iter().any(|s| s == stage) {
            v.stages.push(stage.to_string());
        }
    }
}

#[async_trait]
impl SecretVault for InMemoryVault {
    async fn get_secret_value(
        &self,
        secret_id: &str,
        selector: &VersionSelector,
    ) -> Result<SecretVersion, VaultError> {
        {
            let failures = self.failures.lock().await;
            if let Some(error) = &failures.all_reads {
                return Err(error.clone());
            }
            let stage = selector.stage.as_deref().unwrap_or(STAGE_CURRENT);
            if let Some(error) = failures.by_stage.get(stage) {
                return Err(error.clone());
            }
        }

        let secrets = self.secrets.lock().await;
        let versions = secrets
            .get(secret_id)
            .ok_or_else(|| VaultError::NotFound(format!("secret {secret_id} does not exist")))?;

        let found = match (&selector.version_id, &selector.stage) {
            (Some(id), stage) => {
                let version = versions
                    .iter()
                    .find(|v| &v.version_id == id)
                    .ok_or_else(|| VaultError::NotFound(format!("version {id} does not exist")))?;
                if let Some(stage) = stage {
                    if !version.stages.iter().any(|s| s == stage) {
                        return Err(VaultError::NotFound(format!(
                            "version {id} is not staged as {stage}"
                        )));
                    }
                }
                version
            }
            (None, stage) => {
                let stage = stage.as_deref().unwrap_or(STAGE_CURRENT);
                versions
                    .iter()
                    .find(|v| v.stages.iter().any(|s| s == stage))
                    .ok_or_else(|| VaultError::NotFound(format!("no version staged as {stage}")))?
            }
        };

        Ok(SecretVersion {
            version_id: found.version_id.clone(),
            secret_string: Some(SecretString::from(found.value.clone())),
            stages: found.stages.clone(),
        })
    }

    async fn put_secret_value(
        &self,
        secret_id: &str,
        version_id: &str,
        value: &SecretString,
        stages: &[&str],
    ) -> Result<(), VaultError> {
        self.check_mutation().await?;

        let mut secrets = self.secrets.lock().await;
        let versions = secrets.entry(secret_id.to_string()).or_default();

        if let Some(existing) = versions.iter().find(|v| v.version_id == version_id) {
            if existing.value == value.expose_secret() {
                return Ok(());
            }
            return Err(VaultError::InvalidRequest(format!(
                "version {version_id} already exists with a different value"
            )));
        }

        versions.push(StoredVersion {
            version_id: version_id.to_string(),
            value: value.expose_secret().to_string(),
            stages: Vec::new(),
        });

        let stages: &[&str] = if stages.is_empty() { &[STAGE_CURRENT] } else { stages };
        for stage in stages {
            attach_label(versions, version_id, stage);
        }

        self.puts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn random_password(
        &self,
        length: u32,
        exclude_punctuation: bool,
    ) -> Result<SecretString, VaultError> {
        const PUNCTUATION: &[u8] = b"!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

        let mut rng = rand::thread_rng();
        let password: String = if exclude_punctuation {
            (0..length).map(|_| char::from(rng.sample(Alphanumeric))).collect()
        } else {
            let pick = Uniform::from(0..PUNCTUATION.len());
            (0..length)
                .map(|i| {
                    if i % 4 == 3 {
                        char::from(PUNCTUATION[rng.sample(pick)])
                    } else {
                        char::from(rng.sample(Alphanumeric))
                    }
                })
                .collect()
        };

        self.passwords.fetch_add(1, Ordering::SeqCst);
        Ok(SecretString::from(password))
    }

    async fn version_stages(
        &self,
        secret_id: &str,
    ) -> Result<HashMap<String, Vec<String>>, VaultError> {
        if let Some(error) = &self.failures.lock().await.describe {
            return Err(error.clone());
        }

        let secrets = self.secrets.lock().await;
        let versions = secrets
            .get(secret_id)
            .ok_or_else(|| VaultError::NotFound(format!("secret {secret_id} does not exist")))?;

        Ok(versions
            .iter()
            .map(|v| (v.version_id.clone(), v.stages.clone()))
            .collect())
    }

    async fn update_version_stage(
        &self,
        secret_id: &str,
        update: StageUpdate<'_>,
    ) -> Result<(), VaultError> {
        self.check_mutation().await?;

        let mut secrets = self.secrets.lock().await;
        let versions = secrets
            .get_mut(secret_id)
            .ok_or_else(|| VaultError::NotFound(format!("secret {secret_id} does not exist")))?;

        let holder = versions
            .iter()
            .find(|v| v.stages.iter().any(|s| s == update.stage))
            .map(|v| v.version_id.clone());

        if let Some(remove_from) = update.remove_from {
            if holder.as_deref() != Some(remove_from) {
                return Err(VaultError::InvalidRequest(format!(
                    "{} is not attached to version {remove_from}",
                    update.stage
                )));
            }
        }

        match update.move_to {
            Some(move_to) => {
                if !versions.iter().any(|v| v.version_id == move_to) {
                    return Err(VaultError::NotFound(format!("version {move_to} does not exist")));
                }
                if let Some(holder) = &holder {
                    if holder != move_to && update.remove_from.is_none() {
                        return Err(VaultError::InvalidRequest(format!(
                            "{} is attached to {holder}; remove_from is required",
                            update.stage
                        )));
                    }
                }
                attach_label(versions, move_to, update.stage);
            }
            None => detach_label(versions, update.stage),
        }

        self.stage_updates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
