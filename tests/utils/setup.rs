use serde_json::json;
use std::sync::Arc;

use minigame_arena::assets::{
    clue_image_path, portrait_image_path, weapon_image_path, CharacterEntry, InMemoryAssetStore,
    InMemoryCatalog, ResourceLoader, SkillIcons, WeaponEntry,
};
use minigame_arena::quiz::RawQuestion;
use minigame_arena::remote::{CredentialBroker, StaticToken, SubmissionDispatcher};
use minigame_arena::scoring::{BlobStore, InMemoryBlobStore, ScoringService};
use minigame_arena::{ArenaConfig, ArenaController, IntakeRequest};

use super::mocks::{CountingSessionSource, MockRemote};

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub const WEAPONS: [&str; 5] = [
    "Wolf's Gravestone",
    "Skyward Pride",
    "Aqua Simulacra",
    "Mistsplitter Reforged",
    "Staff of Homa",
];

pub const CHARACTERS: [&str; 2] = ["Nilou", "Kamisato Ayaka"];

pub fn weapon_icon(index: usize) -> String {
    format!("UI_EquipIcon_{}", index)
}

pub fn character_key(name: &str) -> String {
    name.replace(' ', "")
}

pub struct TestSetup {
    pub controller: Arc<ArenaController>,
    pub scoring: Arc<ScoringService>,
    pub store: Arc<InMemoryBlobStore>,
    pub assets: Arc<InMemoryAssetStore>,
    pub remote: MockRemote,
    pub sessions: Arc<CountingSessionSource>,
}

impl TestSetup {
    pub async fn register(&self, uid: &str, name: &str) {
        self.controller
            .register(IntakeRequest {
                uid: uid.to_string(),
                display_name: name.to_string(),
                facebook_link: String::new(),
                image_key: format!("uploads/{}.png", uid),
            })
            .await
            .unwrap();
    }

    /// Registers and answers `correct` questions right, the rest wrong
    pub async fn enter_arena(&self, uid: &str, name: &str, correct: usize) {
        self.register(uid, name).await;
        let progress = self.controller.start_quiz().await.unwrap();
        for i in 0..progress.total {
            let choice = if i < correct { 0 } else { 1 };
            self.controller.answer_quiz(choice).await.unwrap();
        }
    }

    /// Lets spawned submissions run on the test runtime
    pub async fn settle(&self) {
        for _ in 0..50 {
            tokio::task::yield_now().await;
        }
    }
}

pub struct TestSetupBuilder {
    weapons: usize,
    portraits: bool,
    clues: bool,
    questions: usize,
    config: ArenaConfig,
    store: Option<Arc<InMemoryBlobStore>>,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            weapons: 4,
            portraits: true,
            clues: true,
            questions: 10,
            config: ArenaConfig::default(),
            store: None,
        }
    }

    pub fn with_weapons(mut self, count: usize) -> Self {
        self.weapons = count.min(WEAPONS.len());
        self
    }

    pub fn without_portraits(mut self) -> Self {
        self.portraits = false;
        self
    }

    pub fn without_clue_images(mut self) -> Self {
        self.clues = false;
        self
    }

    pub fn with_questions(mut self, count: usize) -> Self {
        self.questions = count;
        self
    }

    pub fn with_config(mut self, config: ArenaConfig) -> Self {
        self.config = config;
        self
    }

    /// Shares persisted state with an earlier setup
    pub fn with_store(mut self, store: Arc<InMemoryBlobStore>) -> Self {
        self.store = Some(store);
        self
    }

    fn catalog(&self) -> InMemoryCatalog {
        let weapons = WEAPONS
            .iter()
            .take(self.weapons)
            .enumerate()
            .map(|(i, name)| WeaponEntry {
                name: name.to_string(),
                icon: weapon_icon(i),
            })
            .collect();

        let characters = CHARACTERS
            .iter()
            .map(|name| {
                let key = character_key(name);
                CharacterEntry {
                    name: name.to_string(),
                    icon: format!("UI_AvatarIcon_{}", key),
                    skill: SkillIcons {
                        normal: Some(format!("Skill_A_{}", key)),
                        elemental: Some(format!("Skill_S_{}_01", key)),
                        burst: None,
                    },
                    talent: Vec::new(),
                    cons: vec![format!("UI_Talent_U_{}_01", key)],
                }
            })
            .collect();

        let questions = (1..=self.questions)
            .map(|i| RawQuestion {
                id: Some(json!(format!("q{}", i))),
                question: Some(format!("Question {}", i)),
                choices: Some(vec!["right".to_string(), "wrong".to_string()]),
                correct_index: Some(0),
                difficulty: Some(json!(1 + i % 3)),
                points: Some(json!(2)),
                tags: Some(json!(["nod-krai"])),
            })
            .collect();

        InMemoryCatalog::new()
            .with_weapons(weapons)
            .with_characters(characters)
            .with_questions(questions)
    }

    fn assets(&self) -> InMemoryAssetStore {
        let assets = InMemoryAssetStore::new();
        for i in 0..self.weapons {
            assets.insert(weapon_image_path(&weapon_icon(i)));
        }
        for name in CHARACTERS {
            let key = character_key(name);
            if self.portraits {
                assets.insert(portrait_image_path(&format!("UI_AvatarIcon_{}", key)));
            }
            if self.clues {
                assets.insert(clue_image_path(&format!("Skill_S_{}_01", key)));
            }
        }
        assets
    }

    pub fn build(self) -> TestSetup {
        let assets = Arc::new(self.assets());
        let loader = ResourceLoader::new(Arc::new(self.catalog()), assets.clone());

        let store = self
            .store
            .clone()
            .unwrap_or_else(|| Arc::new(InMemoryBlobStore::new()));
        let blob_store: Arc<dyn BlobStore> = store.clone();
        let scoring = Arc::new(ScoringService::new(blob_store));

        let remote = MockRemote::new();
        let sessions = Arc::new(CountingSessionSource::default());
        let broker = CredentialBroker::new(
            sessions.clone(),
            Arc::new(StaticToken("challenge".to_string())),
        );
        let dispatcher = SubmissionDispatcher::new(Arc::new(remote.clone()), Arc::new(broker));

        let controller = Arc::new(
            ArenaController::new(self.config, Arc::new(loader), scoring.clone(), dispatcher)
                .with_seed(42),
        );

        TestSetup {
            controller,
            scoring,
            store,
            assets,
            remote,
            sessions,
        }
    }
}
