use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

pub(super) const OG_PREFIX: &str = "og:";
pub(super) const PAGE_PREFIX: &str = "page:";

/// Remembers what the last builds published: the input digest of each
/// preview image and the key of each rendered page.
pub(super) struct BuildCache {
    db: sled::Db,
}

impl BuildCache {
    pub(super) fn open(root: &Path) -> Result<Self> {
        let cache_dir = root.join(super::CACHE_DIR);
        fs::create_dir_all(&cache_dir)
            .with_context(|| format!("failed to create cache directory {}", cache_dir.display()))?;
        let db = sled::open(cache_dir.join("sled")).context("failed to open cache database")?;
        Ok(Self { db })
    }

    /// True when `output` exists and was produced from `digest`.
    pub(super) fn is_fresh(&self, key: &str, digest: &str, output: &Path) -> Result<bool> {
        if !output.is_file() {
            return Ok(false);
        }
        Ok(self.read(key)?.as_deref() == Some(digest))
    }

    pub(super) fn record(&self, key: &str, digest: &str) -> Result<()> {
        self.insert(&format!("{OG_PREFIX}{key}"), digest)
    }

    pub(super) fn record_page(&self, key: &str) -> Result<()> {
        self.insert(&format!("{PAGE_PREFIX}{key}"), "")
    }

    /// Drops every entry under `prefix` whose key is not in `keep` and
    /// returns the dropped keys without the prefix, sorted.
    pub(super) fn prune(&self, prefix: &str, keep: &BTreeSet<String>) -> Result<Vec<String>> {
        let mut stale = Vec::new();
        for entry in self.db.scan_prefix(prefix.as_bytes()) {
            let (key, _) = entry.context("failed to iterate cache entries")?;
            let key = String::from_utf8(key.to_vec()).context("cache key is not valid utf-8")?;
            let suffix = &key[prefix.len()..];
            if !keep.contains(suffix) {
                stale.push(suffix.to_string());
            }
        }

        for key in &stale {
            let cache_key = format!("{prefix}{key}");
            self.db
                .remove(cache_key.as_bytes())
                .with_context(|| format!("failed to remove stale cache entry {cache_key}"))?;
        }
        Ok(stale)
    }

    pub(super) fn flush(&self) -> Result<()> {
        self.db.flush().context("failed to flush cache database")?;
        Ok(())
    }

    fn insert(&self, cache_key: &str, value: &str) -> Result<()> {
        self.db
            .insert(cache_key.as_bytes(), value.as_bytes())
            .with_context(|| format!("failed to update cache key {cache_key}"))?;
        Ok(())
    }

    fn read(&self, key: &str) -> Result<Option<String>> {
        let cache_key = format!("{OG_PREFIX}{key}");
        let value = self
            .db
            .get(cache_key.as_bytes())
            .with_context(|| format!("failed to read cache key {cache_key}"))?;
        value
            .map(|bytes| {
                String::from_utf8(bytes.to_vec())
                    .with_context(|| format!("cache entry for {cache_key} is not valid utf-8"))
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn fresh_only_when_digest_matches_and_file_exists() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("out.png");
        let cache = BuildCache::open(dir.path()).unwrap();

        assert!(!cache.is_fresh("blog/a", "d1", &output).unwrap());
        cache.record("blog/a", "d1").unwrap();
        assert!(!cache.is_fresh("blog/a", "d1", &output).unwrap());

        fs::write(&output, b"png").unwrap();
        assert!(cache.is_fresh("blog/a", "d1", &output).unwrap());
        assert!(!cache.is_fresh("blog/a", "d2", &output).unwrap());
        assert!(!cache.is_fresh("blog/b", "d1", &output).unwrap());
    }

    #[test]
    fn prune_drops_keys_missing_from_the_build() {
        let dir = TempDir::new().unwrap();
        let cache = BuildCache::open(dir.path()).unwrap();
        cache.record("blog/a", "d1").unwrap();
        cache.record("blog/secret", "d2").unwrap();
        cache.record_page("blog/secret").unwrap();

        let keep: BTreeSet<String> = ["blog/a".to_string()].into();
        assert_eq!(cache.prune(OG_PREFIX, &keep).unwrap(), vec!["blog/secret"]);
        assert!(cache.prune(OG_PREFIX, &keep).unwrap().is_empty());
        assert_eq!(cache.read("blog/a").unwrap().as_deref(), Some("d1"));
        assert_eq!(cache.read("blog/secret").unwrap(), None);

        assert_eq!(cache.prune(PAGE_PREFIX, &keep).unwrap(), vec!["blog/secret"]);
    }
}
