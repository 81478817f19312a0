// Catalog and image access for the minigames

pub use catalog::{
    CatalogSource, CharacterEntry, InMemoryCatalog, JsonCatalogSource, SkillIcons, WeaponEntry,
};
pub use loader::{
    clue_image_path, portrait_image_path, weapon_image_path, AssetStore, CharacterClue,
    FsAssetStore, ImageAsset, InMemoryAssetStore, PlayableWeapon, ResourceLoader,
};

mod catalog;
mod loader;
