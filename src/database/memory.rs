//! In-process [`Store`] used by the test suite and by `STORE_BACKEND=memory`.
//!
//! Tables are plain vectors behind one `RwLock`; ids come from per-table
//! counters starting at 1, the way `SERIAL` columns behave.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::database::manager::DatabaseError;
use crate::database::models::{
    Certificate, DbId, Elf, Kid, KidLetter, KidSummary, Letter, NewKid, NewParent, Parent,
    ParentLetter, Responder, ResponseMode, Video,
};
use crate::database::repository::Store;

#[derive(Default)]
struct Tables {
    parents: Vec<Parent>,
    kids: Vec<Kid>,
    elves: Vec<Elf>,
    letters: Vec<Letter>,
    videos: Vec<Video>,
    certificates: Vec<Certificate>,
    next_id: NextIds,
}

#[derive(Default)]
struct NextIds {
    parent: DbId,
    kid: DbId,
    elf: DbId,
    letter: DbId,
    video: DbId,
    certificate: DbId,
}

fn bump(counter: &mut DbId) -> DbId {
    *counter += 1;
    *counter
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store preloaded with a small elf catalog
    pub async fn with_sample_elves() -> Self {
        let store = Self::new();
        store
            .insert_elf("Jingle", "Toy Workshop Lead", "cheerful and full of giggles", Some("🧝"))
            .await;
        store
            .insert_elf("Tinsel", "Reindeer Keeper", "gentle and patient", Some("🦌"))
            .await;
        store
            .insert_elf("Sprinkle", "Cookie Baker", "curious and a little silly", Some("🍪"))
            .await;
        store
    }

    pub async fn insert_elf(&self, name: &str, job: &str, personality: &str, emoji: Option<&str>) -> Elf {
        let mut tables = self.tables.write().await;
        let elf = Elf {
            id: bump(&mut tables.next_id.elf),
            name: name.to_string(),
            job: job.to_string(),
            personality: personality.to_string(),
            emoji: emoji.map(str::to_string),
        };
        tables.elves.push(elf.clone());
        elf
    }

    pub async fn insert_video(&self, title: &str, video_url: &str, is_active: bool, created_at: DateTime<Utc>) -> Video {
        let mut tables = self.tables.write().await;
        let video = Video {
            id: bump(&mut tables.next_id.video),
            title: title.to_string(),
            description: None,
            video_url: video_url.to_string(),
            thumbnail_url: None,
            is_active,
            created_at,
        };
        tables.videos.push(video.clone());
        video
    }

    pub async fn insert_certificate(
        &self,
        kid_id: DbId,
        certificate_type: &str,
        title: &str,
        issued_at: DateTime<Utc>,
    ) -> Certificate {
        let mut tables = self.tables.write().await;
        let certificate = Certificate {
            id: bump(&mut tables.next_id.certificate),
            kid_id,
            certificate_type: certificate_type.to_string(),
            title: Some(title.to_string()),
            issued_at,
        };
        tables.certificates.push(certificate.clone());
        certificate
    }

    /// Number of kid rows, used to assert that failed registrations left nothing behind
    pub async fn kid_count(&self) -> usize {
        self.tables.read().await.kids.len()
    }

    pub async fn letter(&self, id: DbId) -> Option<Letter> {
        self.tables.read().await.letters.iter().find(|l| l.id == id).cloned()
    }
}

// Newest first; ties on the timestamp fall back to the higher id
fn newest_first<T>(rows: &mut [T], key: impl Fn(&T) -> (DateTime<Utc>, DbId)) {
    rows.sort_by(|a, b| key(b).cmp(&key(a)));
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn find_parent(&self, id: DbId) -> Result<Option<Parent>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.parents.iter().find(|p| p.id == id).cloned())
    }

    async fn find_parent_by_email(&self, email: &str) -> Result<Option<Parent>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.parents.iter().find(|p| p.email == email).cloned())
    }

    async fn find_parent_by_code(&self, code: &str) -> Result<Option<Parent>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.parents.iter().find(|p| p.parent_code == code).cloned())
    }

    async fn create_parent(&self, parent: NewParent) -> Result<Parent, DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.parents.iter().any(|p| p.email == parent.email) {
            return Err(DatabaseError::Conflict("Email already registered".to_string()));
        }

        let row = Parent {
            id: bump(&mut tables.next_id.parent),
            email: parent.email,
            password: parent.password_hash,
            name: parent.name,
            parent_code: parent.parent_code,
            subscription_status: None,
            subscription_plan: None,
            subscription_date: None,
            response_mode: ResponseMode::Ai,
            created_at: Utc::now(),
        };
        tables.parents.push(row.clone());
        Ok(row)
    }

    async fn set_response_mode(&self, parent_id: DbId, mode: ResponseMode) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        if let Some(parent) = tables.parents.iter_mut().find(|p| p.id == parent_id) {
            parent.response_mode = mode;
        }
        Ok(())
    }

    async fn activate_subscription(&self, parent_id: DbId, plan: &str) -> Result<bool, DatabaseError> {
        let mut tables = self.tables.write().await;
        match tables.parents.iter_mut().find(|p| p.id == parent_id) {
            Some(parent) => {
                parent.subscription_status = Some("active".to_string());
                parent.subscription_plan = Some(plan.to_string());
                parent.subscription_date = Some(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_kids(&self, parent_id: DbId) -> Result<Vec<KidSummary>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .kids
            .iter()
            .filter(|k| k.parent_id == parent_id)
            .map(KidSummary::from)
            .collect())
    }

    async fn find_kid(&self, id: DbId) -> Result<Option<Kid>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.kids.iter().find(|k| k.id == id).cloned())
    }

    async fn find_kid_by_username(&self, username: &str) -> Result<Option<Kid>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.kids.iter().find(|k| k.username == username).cloned())
    }

    async fn create_kid(&self, kid: NewKid) -> Result<Kid, DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.kids.iter().any(|k| k.username == kid.username) {
            return Err(DatabaseError::Conflict("Username already taken".to_string()));
        }

        let row = Kid {
            id: bump(&mut tables.next_id.kid),
            parent_id: kid.parent_id,
            username: kid.username,
            password: kid.password_hash,
            name: kid.name,
            age: kid.age,
            elf_id: None,
            created_at: Utc::now(),
        };
        tables.kids.push(row.clone());
        Ok(row)
    }

    async fn set_kid_elf(&self, kid_id: DbId, elf_id: DbId) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        if let Some(kid) = tables.kids.iter_mut().find(|k| k.id == kid_id) {
            kid.elf_id = Some(elf_id);
        }
        Ok(())
    }

    async fn response_mode_for_kid(&self, kid_id: DbId) -> Result<Option<ResponseMode>, DatabaseError> {
        let tables = self.tables.read().await;
        let mode = tables
            .kids
            .iter()
            .find(|k| k.id == kid_id)
            .and_then(|kid| tables.parents.iter().find(|p| p.id == kid.parent_id))
            .map(|parent| parent.response_mode);
        Ok(mode)
    }

    async fn list_elves(&self) -> Result<Vec<Elf>, DatabaseError> {
        let tables = self.tables.read().await;
        let mut elves = tables.elves.clone();
        elves.sort_by_key(|e| e.id);
        Ok(elves)
    }

    async fn find_elf(&self, id: DbId) -> Result<Option<Elf>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.elves.iter().find(|e| e.id == id).cloned())
    }

    async fn create_letter(&self, kid_id: DbId, elf_id: DbId, content: &str) -> Result<Letter, DatabaseError> {
        let mut tables = self.tables.write().await;
        let letter = Letter {
            id: bump(&mut tables.next_id.letter),
            kid_id,
            elf_id,
            content: content.to_string(),
            sent_at: Utc::now(),
            response: None,
            response_at: None,
            responded_by: None,
        };
        tables.letters.push(letter.clone());
        Ok(letter)
    }

    async fn attach_response(
        &self,
        letter_id: DbId,
        response: &str,
        responder: Responder,
    ) -> Result<Option<Letter>, DatabaseError> {
        let mut tables = self.tables.write().await;
        let updated = tables.letters.iter_mut().find(|l| l.id == letter_id).map(|letter| {
            letter.response = Some(response.to_string());
            letter.response_at = Some(Utc::now());
            letter.responded_by = Some(responder.as_str().to_string());
            letter.clone()
        });
        Ok(updated)
    }

    async fn letter_parent_id(&self, letter_id: DbId) -> Result<Option<DbId>, DatabaseError> {
        let tables = self.tables.read().await;
        let parent_id = tables
            .letters
            .iter()
            .find(|l| l.id == letter_id)
            .and_then(|letter| tables.kids.iter().find(|k| k.id == letter.kid_id))
            .map(|kid| kid.parent_id);
        Ok(parent_id)
    }

    async fn list_kid_letters(&self, kid_id: DbId) -> Result<Vec<KidLetter>, DatabaseError> {
        let tables = self.tables.read().await;
        let mut letters: Vec<KidLetter> = tables
            .letters
            .iter()
            .filter(|l| l.kid_id == kid_id)
            .filter_map(|letter| {
                // Inner join: letters whose elf vanished are not listed
                let elf = tables.elves.iter().find(|e| e.id == letter.elf_id)?;
                Some(KidLetter {
                    letter: letter.clone(),
                    elf_name: elf.name.clone(),
                    elf_emoji: elf.emoji.clone(),
                })
            })
            .collect();
        newest_first(&mut letters, |l| (l.letter.sent_at, l.letter.id));
        Ok(letters)
    }

    async fn list_parent_letters(&self, parent_id: DbId) -> Result<Vec<ParentLetter>, DatabaseError> {
        let tables = self.tables.read().await;
        let mut letters: Vec<ParentLetter> = tables
            .letters
            .iter()
            .filter_map(|letter| {
                let kid = tables
                    .kids
                    .iter()
                    .find(|k| k.id == letter.kid_id && k.parent_id == parent_id)?;
                let elf = tables.elves.iter().find(|e| e.id == letter.elf_id)?;
                Some(ParentLetter {
                    letter: letter.clone(),
                    kid_name: kid.name.clone(),
                    elf_name: elf.name.clone(),
                })
            })
            .collect();
        newest_first(&mut letters, |l| (l.letter.sent_at, l.letter.id));
        Ok(letters)
    }

    async fn list_active_videos(&self) -> Result<Vec<Video>, DatabaseError> {
        let tables = self.tables.read().await;
        let mut videos: Vec<Video> = tables.videos.iter().filter(|v| v.is_active).cloned().collect();
        newest_first(&mut videos, |v| (v.created_at, v.id));
        Ok(videos)
    }

    async fn list_certificates(&self, kid_id: DbId) -> Result<Vec<Certificate>, DatabaseError> {
        let tables = self.tables.read().await;
        let mut certificates: Vec<Certificate> = tables
            .certificates
            .iter()
            .filter(|c| c.kid_id == kid_id)
            .cloned()
            .collect();
        newest_first(&mut certificates, |c| (c.issued_at, c.id));
        Ok(certificates)
    }
}
