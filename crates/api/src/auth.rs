use anyhow::{anyhow, Result};
use directories::ProjectDirs;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

const PROFILE_FILE: &str = "profile.bin";
const KEY_FILE: &str = ".secret_key";

/// Login details for one store, remembered between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub base_url: String,
    /// Store id; the owner's WhatsApp number.
    pub phone: String,
    pub pin: String,
    #[serde(default)]
    pub session_name: Option<String>,
    /// Eight-character token from the store's remote-counter link.
    #[serde(default)]
    pub remote_token: Option<String>,
}

impl Profile {
    /// Session name the backend uses for this store's WhatsApp link.
    pub fn session_name(&self) -> String {
        self.session_name
            .clone()
            .unwrap_or_else(|| format!("session_{}", self.phone))
    }
}

/// Encrypted on-disk home for the [`Profile`].
#[derive(Debug, Clone)]
pub struct ProfileStore {
    dir: PathBuf,
}

impl ProfileStore {
    pub fn default_location() -> Result<Self> {
        let proj_dirs = ProjectDirs::from("com", "wabot", "wabot")
            .ok_or_else(|| anyhow!("Could not determine project directories"))?;
        Ok(Self::at(proj_dirs.data_dir()))
    }

    pub fn at(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn profile_path(&self) -> PathBuf {
        self.dir.join(PROFILE_FILE)
    }

    fn key_path(&self) -> PathBuf {
        self.dir.join(KEY_FILE)
    }

    pub fn load(&self) -> Result<Option<Profile>> {
        let path = self.profile_path();
        if !path.exists() {
            return Ok(None);
        }

        let encrypted = fs::read(&path)?;
        let decrypted = self.decrypt(&encrypted)?;
        let profile: Profile = serde_json::from_slice(&decrypted)?;
        Ok(Some(profile))
    }

    pub fn save(&self, profile: &Profile) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_vec(profile)?;
        let encrypted = self.encrypt(&json)?;
        write_secure_file(&self.profile_path(), &encrypted)
    }

    pub fn clear(&self) -> Result<()> {
        let path = self.profile_path();
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    fn get_or_create_key(&self) -> Result<[u8; 32]> {
        let path = self.key_path();

        if path.exists() {
            let key_bytes = fs::read(&path)?;
            if key_bytes.len() == 32 {
                let mut key = [0u8; 32];
                key.copy_from_slice(&key_bytes);
                return Ok(key);
            }
        }

        fs::create_dir_all(&self.dir)?;
        let mut key = [0u8; 32];
        rand::thread_rng().fill(&mut key);
        write_secure_file(&path, &key)?;
        Ok(key)
    }

    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        use aes_gcm::{
            aead::{Aead, KeyInit},
            Aes256Gcm, Nonce,
        };

        let key = self.get_or_create_key()?;
        let cipher = Aes256Gcm::new(aes_gcm::aead::Key::<Aes256Gcm>::from_slice(&key));

        let mut nonce_bytes = [0u8; 12];
        rand::thread_rng().fill(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext)
            .map_err(|_| anyhow!("Encryption failed"))?;

        let mut result = nonce_bytes.to_vec();
        result.extend_from_slice(&ciphertext);
        Ok(result)
    }

    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        use aes_gcm::{
            aead::{Aead, KeyInit},
            Aes256Gcm, Nonce,
        };

        if ciphertext.len() < 12 {
            return Err(anyhow!("Invalid ciphertext"));
        }

        let key = self.get_or_create_key()?;
        let cipher = Aes256Gcm::new(aes_gcm::aead::Key::<Aes256Gcm>::from_slice(&key));

        let nonce = Nonce::from_slice(&ciphertext[..12]);
        cipher
            .decrypt(nonce, &ciphertext[12..])
            .map_err(|_| anyhow!("Decryption failed"))
    }
}

fn write_secure_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = file.metadata()?.permissions();
        perms.set_mode(0o600);
        fs::set_permissions(path, perms)?;
    }
    Ok(())
}
