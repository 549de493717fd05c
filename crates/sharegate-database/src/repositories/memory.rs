//! In-process implementation of every store.
//!
//! All tables live behind one mutex, so each trait method is atomic in the
//! same way the corresponding SQL statement or transaction is.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use uuid::Uuid;

use sharegate_core::error::AppError;
use sharegate_core::result::AppResult;
use sharegate_entity::Alias;
use sharegate_entity::file::{CreateFile, File};
use sharegate_entity::reverse_share::{
    AdoptionState, CreateReverseShare, NewReverseShareFile, ReverseShare, ReverseShareAlias,
    ReverseShareFile, UpdateReverseShare,
};
use sharegate_entity::share::{CreateShare, Share, ShareAlias, UpdateShare};

use super::file::FileStore;
use super::reverse_share::ReverseShareStore;
use super::share::ShareStore;

#[derive(Debug, Default)]
struct Tables {
    files: HashMap<Uuid, File>,
    shares: HashMap<Uuid, Share>,
    share_files: HashMap<Uuid, Vec<Uuid>>,
    share_recipients: HashMap<Uuid, BTreeSet<String>>,
    share_aliases: HashMap<String, ShareAlias>,
    reverse_shares: HashMap<Uuid, ReverseShare>,
    reverse_share_aliases: HashMap<String, ReverseShareAlias>,
    reverse_share_files: HashMap<Uuid, ReverseShareFile>,
}

impl Tables {
    fn insert_reverse_share_file(&mut self, file: &NewReverseShareFile) -> ReverseShareFile {
        let row = ReverseShareFile {
            id: Uuid::new_v4(),
            reverse_share_id: file.reverse_share_id,
            name: file.name.clone(),
            extension: file.extension.clone(),
            size: file.size,
            object_name: file.object_name.clone(),
            uploader_name: file.uploader_name.clone(),
            uploader_email: file.uploader_email.clone(),
            adoption_state: AdoptionState::Pending,
            adopted_file_id: None,
            registered_at: Utc::now(),
        };
        self.reverse_share_files.insert(row.id, row.clone());
        row
    }

    fn insert_file(&mut self, data: &CreateFile) -> AppResult<File> {
        if self
            .files
            .values()
            .any(|f| f.object_name == data.object_name)
        {
            return Err(AppError::conflict("Failed to create file: already exists"));
        }
        let file = File {
            id: Uuid::new_v4(),
            name: data.name.clone(),
            extension: data.extension.clone(),
            size: data.size,
            object_name: data.object_name.clone(),
            owner_id: data.owner_id,
            created_at: Utc::now(),
        };
        self.files.insert(file.id, file.clone());
        Ok(file)
    }
}

/// Stores backed by process memory. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryDatabase {
    tables: Mutex<Tables>,
}

impl MemoryDatabase {
    /// Create an empty database.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ShareStore for MemoryDatabase {
    async fn create(
        &self,
        data: &CreateShare,
        file_ids: &[Uuid],
        recipients: &[String],
        alias: &Alias,
    ) -> AppResult<Share> {
        let mut t = self.tables.lock();
        if t.share_aliases.contains_key(alias.as_str()) {
            return Err(AppError::conflict("Alias already in use"));
        }

        let now = Utc::now();
        let share = Share {
            id: Uuid::new_v4(),
            name: data.name.clone(),
            description: data.description.clone(),
            expiration: data.expiration,
            max_views: data.max_views,
            views: 0,
            password_hash: data.password_hash.clone(),
            owner_id: data.owner_id,
            created_at: now,
            updated_at: now,
        };

        let mut ordered = Vec::with_capacity(file_ids.len());
        for id in file_ids {
            if !ordered.contains(id) {
                ordered.push(*id);
            }
        }
        t.share_files.insert(share.id, ordered);
        t.share_recipients
            .insert(share.id, recipients.iter().cloned().collect());
        t.share_aliases.insert(
            alias.as_str().to_string(),
            ShareAlias {
                alias: alias.as_str().to_string(),
                share_id: share.id,
                created_at: now,
            },
        );
        t.shares.insert(share.id, share.clone());
        Ok(share)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Share>> {
        Ok(self.tables.lock().shares.get(&id).cloned())
    }

    async fn find_by_alias(&self, alias: &str) -> AppResult<Option<Share>> {
        let t = self.tables.lock();
        Ok(t
            .share_aliases
            .get(alias)
            .and_then(|a| t.shares.get(&a.share_id))
            .cloned())
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<Share>> {
        let t = self.tables.lock();
        let mut shares: Vec<Share> = t
            .shares
            .values()
            .filter(|s| s.owner_id == owner_id)
            .cloned()
            .collect();
        shares.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(shares)
    }

    async fn update(&self, id: Uuid, changes: &UpdateShare) -> AppResult<Share> {
        let mut t = self.tables.lock();
        let share = t
            .shares
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("Share not found"))?;
        changes.apply_to(share);
        Ok(share.clone())
    }

    async fn set_password_hash(&self, id: Uuid, hash: Option<&str>) -> AppResult<()> {
        let mut t = self.tables.lock();
        if let Some(share) = t.shares.get_mut(&id) {
            share.password_hash = hash.map(String::from);
            share.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut t = self.tables.lock();
        t.shares.remove(&id);
        t.share_files.remove(&id);
        t.share_recipients.remove(&id);
        t.share_aliases.retain(|_, a| a.share_id != id);
        Ok(())
    }

    async fn try_increment_views(&self, id: Uuid) -> AppResult<Option<i32>> {
        let mut t = self.tables.lock();
        let Some(share) = t.shares.get_mut(&id) else {
            return Ok(None);
        };
        if share.is_exhausted() {
            return Ok(None);
        }
        share.views += 1;
        Ok(Some(share.views))
    }

    async fn file_ids(&self, share_id: Uuid) -> AppResult<Vec<Uuid>> {
        Ok(self
            .tables
            .lock()
            .share_files
            .get(&share_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn add_files(&self, share_id: Uuid, file_ids: &[Uuid]) -> AppResult<()> {
        let mut t = self.tables.lock();
        let files = t.share_files.entry(share_id).or_default();
        for id in file_ids {
            if !files.contains(id) {
                files.push(*id);
            }
        }
        Ok(())
    }

    async fn remove_files(&self, share_id: Uuid, file_ids: &[Uuid]) -> AppResult<()> {
        let mut t = self.tables.lock();
        if let Some(files) = t.share_files.get_mut(&share_id) {
            files.retain(|id| !file_ids.contains(id));
        }
        Ok(())
    }

    async fn recipients(&self, share_id: Uuid) -> AppResult<Vec<String>> {
        Ok(self
            .tables
            .lock()
            .share_recipients
            .get(&share_id)
            .map(|r| r.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn add_recipients(&self, share_id: Uuid, emails: &[String]) -> AppResult<()> {
        let mut t = self.tables.lock();
        t.share_recipients
            .entry(share_id)
            .or_default()
            .extend(emails.iter().cloned());
        Ok(())
    }

    async fn remove_recipients(&self, share_id: Uuid, emails: &[String]) -> AppResult<()> {
        let mut t = self.tables.lock();
        if let Some(recipients) = t.share_recipients.get_mut(&share_id) {
            recipients.retain(|e| !emails.contains(e));
        }
        Ok(())
    }

    async fn alias_of(&self, share_id: Uuid) -> AppResult<Option<ShareAlias>> {
        Ok(self
            .tables
            .lock()
            .share_aliases
            .values()
            .find(|a| a.share_id == share_id)
            .cloned())
    }

    async fn set_alias(&self, share_id: Uuid, alias: &Alias) -> AppResult<ShareAlias> {
        let mut t = self.tables.lock();
        if let Some(existing) = t.share_aliases.get(alias.as_str()) {
            if existing.share_id != share_id {
                return Err(AppError::conflict("Alias already in use"));
            }
        }
        t.share_aliases.retain(|_, a| a.share_id != share_id);
        let row = ShareAlias {
            alias: alias.as_str().to_string(),
            share_id,
            created_at: Utc::now(),
        };
        t.share_aliases.insert(row.alias.clone(), row.clone());
        Ok(row)
    }
}

#[async_trait]
impl ReverseShareStore for MemoryDatabase {
    async fn create(&self, data: &CreateReverseShare, alias: &Alias) -> AppResult<ReverseShare> {
        let mut t = self.tables.lock();
        if t.reverse_share_aliases.contains_key(alias.as_str()) {
            return Err(AppError::conflict("Alias already in use"));
        }
        let now = Utc::now();
        let reverse_share = ReverseShare {
            id: Uuid::new_v4(),
            name: data.name.clone(),
            description: data.description.clone(),
            expiration: data.expiration,
            max_files: data.max_files,
            max_file_size: data.max_file_size,
            allowed_file_types: data.allowed_file_types.clone(),
            password_hash: data.password_hash.clone(),
            is_active: true,
            owner_id: data.owner_id,
            created_at: now,
            updated_at: now,
        };
        t.reverse_share_aliases.insert(
            alias.as_str().to_string(),
            ReverseShareAlias {
                alias: alias.as_str().to_string(),
                reverse_share_id: reverse_share.id,
                created_at: now,
            },
        );
        t.reverse_shares
            .insert(reverse_share.id, reverse_share.clone());
        Ok(reverse_share)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<ReverseShare>> {
        Ok(self.tables.lock().reverse_shares.get(&id).cloned())
    }

    async fn find_by_alias(&self, alias: &str) -> AppResult<Option<ReverseShare>> {
        let t = self.tables.lock();
        Ok(t
            .reverse_share_aliases
            .get(alias)
            .and_then(|a| t.reverse_shares.get(&a.reverse_share_id))
            .cloned())
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<ReverseShare>> {
        let t = self.tables.lock();
        let mut list: Vec<ReverseShare> = t
            .reverse_shares
            .values()
            .filter(|r| r.owner_id == owner_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }

    async fn update(&self, id: Uuid, changes: &UpdateReverseShare) -> AppResult<ReverseShare> {
        let mut t = self.tables.lock();
        let rs = t
            .reverse_shares
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("Reverse share not found"))?;
        changes.apply_to(rs);
        Ok(rs.clone())
    }

    async fn set_password_hash(&self, id: Uuid, hash: Option<&str>) -> AppResult<()> {
        let mut t = self.tables.lock();
        if let Some(rs) = t.reverse_shares.get_mut(&id) {
            rs.password_hash = hash.map(String::from);
            rs.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut t = self.tables.lock();
        t.reverse_shares.remove(&id);
        t.reverse_share_aliases
            .retain(|_, a| a.reverse_share_id != id);
        t.reverse_share_files
            .retain(|_, f| f.reverse_share_id != id);
        Ok(())
    }

    async fn alias_of(&self, reverse_share_id: Uuid) -> AppResult<Option<ReverseShareAlias>> {
        Ok(self
            .tables
            .lock()
            .reverse_share_aliases
            .values()
            .find(|a| a.reverse_share_id == reverse_share_id)
            .cloned())
    }

    async fn set_alias(
        &self,
        reverse_share_id: Uuid,
        alias: &Alias,
    ) -> AppResult<ReverseShareAlias> {
        let mut t = self.tables.lock();
        if let Some(existing) = t.reverse_share_aliases.get(alias.as_str()) {
            if existing.reverse_share_id != reverse_share_id {
                return Err(AppError::conflict("Alias already in use"));
            }
        }
        t.reverse_share_aliases
            .retain(|_, a| a.reverse_share_id != reverse_share_id);
        let row = ReverseShareAlias {
            alias: alias.as_str().to_string(),
            reverse_share_id,
            created_at: Utc::now(),
        };
        t.reverse_share_aliases
            .insert(row.alias.clone(), row.clone());
        Ok(row)
    }

    async fn register_file(
        &self,
        file: &NewReverseShareFile,
        max_files: Option<i32>,
    ) -> AppResult<ReverseShareFile> {
        let mut t = self.tables.lock();
        if !t.reverse_shares.contains_key(&file.reverse_share_id) {
            return Err(AppError::not_found("Reverse share not found"));
        }
        if t
            .reverse_share_files
            .values()
            .any(|f| f.object_name == file.object_name)
        {
            return Err(AppError::conflict("File is already registered"));
        }
        if let Some(max) = max_files {
            let count = t
                .reverse_share_files
                .values()
                .filter(|f| f.reverse_share_id == file.reverse_share_id)
                .count();
            if count as i64 >= i64::from(max) {
                return Err(AppError::validation("Maximum number of files reached"));
            }
        }
        Ok(t.insert_reverse_share_file(file))
    }

    async fn find_file(&self, id: Uuid) -> AppResult<Option<ReverseShareFile>> {
        Ok(self.tables.lock().reverse_share_files.get(&id).cloned())
    }

    async fn list_files(&self, reverse_share_id: Uuid) -> AppResult<Vec<ReverseShareFile>> {
        let t = self.tables.lock();
        let mut files: Vec<ReverseShareFile> = t
            .reverse_share_files
            .values()
            .filter(|f| f.reverse_share_id == reverse_share_id)
            .cloned()
            .collect();
        files.sort_by(|a, b| a.registered_at.cmp(&b.registered_at));
        Ok(files)
    }

    async fn rename_file(&self, id: Uuid, name: &str) -> AppResult<ReverseShareFile> {
        let mut t = self.tables.lock();
        let file = t
            .reverse_share_files
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("File not found"))?;
        file.name = name.to_string();
        Ok(file.clone())
    }

    async fn delete_file(&self, id: Uuid) -> AppResult<()> {
        self.tables.lock().reverse_share_files.remove(&id);
        Ok(())
    }

    async fn commit_adoption(&self, file_id: Uuid, library_file: &CreateFile) -> AppResult<File> {
        let mut t = self.tables.lock();
        let pending = t
            .reverse_share_files
            .get(&file_id)
            .is_some_and(|f| f.adoption_state == AdoptionState::Pending);
        if !pending {
            return Err(AppError::conflict("File is no longer pending adoption"));
        }
        let file = t.insert_file(library_file)?;
        if let Some(row) = t.reverse_share_files.get_mut(&file_id) {
            row.adoption_state = AdoptionState::Adopted;
            row.adopted_file_id = Some(file.id);
        }
        Ok(file)
    }

    async fn mark_failed(&self, file_id: Uuid) -> AppResult<bool> {
        let mut t = self.tables.lock();
        match t.reverse_share_files.get_mut(&file_id) {
            Some(row) if row.adoption_state == AdoptionState::Pending => {
                row.adoption_state = AdoptionState::Failed;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn reset_failed(&self, file_id: Uuid) -> AppResult<ReverseShareFile> {
        let mut t = self.tables.lock();
        let failed = match t.reverse_share_files.get(&file_id) {
            Some(row) if row.adoption_state == AdoptionState::Failed => row.clone(),
            _ => return Err(AppError::conflict("File is not in a failed state")),
        };
        t.reverse_share_files.remove(&file_id);
        Ok(t.insert_reverse_share_file(&NewReverseShareFile::from(&failed)))
    }
}

#[async_trait]
impl FileStore for MemoryDatabase {
    async fn create(&self, data: &CreateFile) -> AppResult<File> {
        self.tables.lock().insert_file(data)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<File>> {
        Ok(self.tables.lock().files.get(&id).cloned())
    }

    async fn find_many(&self, ids: &[Uuid]) -> AppResult<Vec<File>> {
        let t = self.tables.lock();
        Ok(ids.iter().filter_map(|id| t.files.get(id).cloned()).collect())
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<File>> {
        let t = self.tables.lock();
        let mut files: Vec<File> = t
            .files
            .values()
            .filter(|f| f.owner_id == owner_id)
            .cloned()
            .collect();
        files.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(files)
    }

    async fn total_size(&self, owner_id: Uuid) -> AppResult<i64> {
        let t = self.tables.lock();
        Ok(t.files
            .values()
            .filter(|f| f.owner_id == owner_id)
            .map(|f| f.size)
            .sum())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut t = self.tables.lock();
        t.files.remove(&id);
        for files in t.share_files.values_mut() {
            files.retain(|f| *f != id);
        }
        for row in t.reverse_share_files.values_mut() {
            if row.adopted_file_id == Some(id) {
                row.adopted_file_id = None;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use sharegate_core::error::ErrorKind;

    use super::*;

    fn new_share(owner_id: Uuid, max_views: Option<i32>) -> CreateShare {
        CreateShare {
            name: Some("Quarterly".into()),
            description: None,
            expiration: None,
            max_views,
            password_hash: None,
            owner_id,
        }
    }

    fn new_reverse_share(owner_id: Uuid) -> CreateReverseShare {
        CreateReverseShare {
            name: None,
            description: None,
            expiration: None,
            max_files: Some(1),
            max_file_size: None,
            allowed_file_types: None,
            password_hash: None,
            owner_id,
        }
    }

    fn upload(reverse_share_id: Uuid) -> NewReverseShareFile {
        NewReverseShareFile {
            reverse_share_id,
            name: "scan".into(),
            extension: "pdf".into(),
            size: 42,
            object_name: format!("reverse-shares/{reverse_share_id}/scan.pdf"),
            uploader_name: None,
            uploader_email: None,
        }
    }

    #[tokio::test]
    async fn test_concurrent_view_increments_respect_limit() {
        let db = Arc::new(MemoryDatabase::new());
        let share = ShareStore::create(
            db.as_ref(),
            &new_share(Uuid::new_v4(), Some(5)),
            &[],
            &[],
            &Alias::parse("limited").unwrap(),
        )
        .await
        .unwrap();

        let mut handles = Vec::new();
        for _ in 0..20 {
            let db = db.clone();
            handles.push(tokio::spawn(async move {
                db.try_increment_views(share.id).await.unwrap()
            }));
        }
        let mut wins = 0;
        for handle in handles {
            if handle.await.unwrap().is_some() {
                wins += 1;
            }
        }
        assert_eq!(wins, 5);
        let stored = ShareStore::find_by_id(db.as_ref(), share.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.views, 5);
    }

    #[tokio::test]
    async fn test_alias_conflict_and_replace() {
        let db = MemoryDatabase::new();
        let owner = Uuid::new_v4();
        let first = ShareStore::create(
            &db,
            &new_share(owner, None),
            &[],
            &[],
            &Alias::parse("taken").unwrap(),
        )
        .await
        .unwrap();
        let second = ShareStore::create(
            &db,
            &new_share(owner, None),
            &[],
            &[],
            &Alias::parse("other").unwrap(),
        )
        .await
        .unwrap();

        let err = ShareStore::set_alias(&db, second.id, &Alias::parse("taken").unwrap())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);

        ShareStore::set_alias(&db, first.id, &Alias::parse("renamed").unwrap())
            .await
            .unwrap();
        assert!(ShareStore::find_by_alias(&db, "taken").await.unwrap().is_none());
        assert_eq!(
            ShareStore::find_by_alias(&db, "renamed")
                .await
                .unwrap()
                .unwrap()
                .id,
            first.id
        );
    }

    #[tokio::test]
    async fn test_register_file_enforces_max_files() {
        let db = MemoryDatabase::new();
        let rs = ReverseShareStore::create(
            &db,
            &new_reverse_share(Uuid::new_v4()),
            &Alias::parse("inbox").unwrap(),
        )
        .await
        .unwrap();

        db.register_file(&upload(rs.id), rs.max_files).await.unwrap();
        let mut second = upload(rs.id);
        second.object_name = format!("reverse-shares/{}/other.pdf", rs.id);
        let err = db.register_file(&second, rs.max_files).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_object_registers_once() {
        let db = MemoryDatabase::new();
        let rs = ReverseShareStore::create(
            &db,
            &new_reverse_share(Uuid::new_v4()),
            &Alias::parse("inbox").unwrap(),
        )
        .await
        .unwrap();

        db.register_file(&upload(rs.id), None).await.unwrap();
        let err = db.register_file(&upload(rs.id), None).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
        assert_eq!(db.list_files(rs.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_adoption_state_is_monotonic() {
        let db = MemoryDatabase::new();
        let owner = Uuid::new_v4();
        let rs = ReverseShareStore::create(
            &db,
            &new_reverse_share(owner),
            &Alias::parse("inbox").unwrap(),
        )
        .await
        .unwrap();
        let file = db.register_file(&upload(rs.id), None).await.unwrap();

        assert!(db.mark_failed(file.id).await.unwrap());
        assert!(!db.mark_failed(file.id).await.unwrap());

        let library = CreateFile {
            name: "scan".into(),
            extension: "pdf".into(),
            size: 42,
            object_name: format!("{owner}/1-scan.pdf"),
            owner_id: owner,
        };
        let err = db.commit_adoption(file.id, &library).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
        assert!(FileStore::list_by_owner(&db, owner).await.unwrap().is_empty());

        let fresh = db.reset_failed(file.id).await.unwrap();
        assert_ne!(fresh.id, file.id);
        assert_eq!(fresh.adoption_state, AdoptionState::Pending);
        assert_eq!(fresh.object_name, file.object_name);
        assert!(db.find_file(file.id).await.unwrap().is_none());

        let adopted = db.commit_adoption(fresh.id, &library).await.unwrap();
        let row = db.find_file(fresh.id).await.unwrap().unwrap();
        assert_eq!(row.adoption_state, AdoptionState::Adopted);
        assert_eq!(row.adopted_file_id, Some(adopted.id));
    }

    #[tokio::test]
    async fn test_share_files_keep_order_and_cascade() {
        let db = MemoryDatabase::new();
        let owner = Uuid::new_v4();
        let a = FileStore::create(
            &db,
            &CreateFile {
                name: "a".into(),
                extension: "txt".into(),
                size: 1,
                object_name: "a".into(),
                owner_id: owner,
            },
        )
        .await
        .unwrap();
        let b = FileStore::create(
            &db,
            &CreateFile {
                name: "b".into(),
                extension: "txt".into(),
                size: 1,
                object_name: "b".into(),
                owner_id: owner,
            },
        )
        .await
        .unwrap();

        let share = ShareStore::create(
            &db,
            &new_share(owner, None),
            &[b.id, a.id, b.id],
            &["x@example.com".into()],
            &Alias::parse("bundle").unwrap(),
        )
        .await
        .unwrap();
        assert_eq!(db.file_ids(share.id).await.unwrap(), vec![b.id, a.id]);

        FileStore::delete(&db, b.id).await.unwrap();
        assert_eq!(db.file_ids(share.id).await.unwrap(), vec![a.id]);

        ShareStore::delete(&db, share.id).await.unwrap();
        assert!(ShareStore::find_by_alias(&db, "bundle").await.unwrap().is_none());
        assert!(db.recipients(share.id).await.unwrap().is_empty());
    }
}
