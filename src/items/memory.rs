use async_trait::async_trait;

use super::repo::ItemRepository;
use super::repo_types::{DamageType, ItemRecord, ItemRow, PropertiesRow, SkillRow, WeaponType};

/// Fixed item catalogue kept in memory.
#[derive(Default)]
pub struct MemoryItemRepository {
    items: Vec<ItemRecord>,
}

impl MemoryItemRepository {
    pub fn new(mut items: Vec<ItemRecord>) -> Self {
        items.sort_by_key(|r| r.item.ingame_id);
        Self { items }
    }
}

#[async_trait]
impl ItemRepository for MemoryItemRepository {
    async fn list(&self, skip: i64, limit: i64) -> anyhow::Result<Vec<ItemRecord>> {
        Ok(self
            .items
            .iter()
            .skip(skip as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn count(&self) -> anyhow::Result<i64> {
        Ok(self.items.len() as i64)
    }

    async fn get_by_ingame_id(&self, ingame_id: i32) -> anyhow::Result<Option<ItemRecord>> {
        Ok(self.items.iter().find(|r| r.item.ingame_id == ingame_id).cloned())
    }
}

pub fn sample_item(ingame_id: i32) -> ItemRow {
    ItemRow {
        id: ingame_id,
        ingame_id,
        title_id: 1000 + ingame_id,
        title: format!("Weapon #{ingame_id}"),
        image_id: 2000 + ingame_id,
        image_url: format!("http://example.com/{}", 2000 + ingame_id),
        damage_type: Some(DamageType::Fire),
        rarity: 4,
    }
}

pub fn sample_properties(item_id: i32) -> PropertiesRow {
    PropertiesRow {
        id: item_id,
        item_id,
        max_lvl: 50,
        cost: Some(6),
        max_lvl_damage: Some(820),
        max_lvl_ammo: Some(30),
        max_lvl_atk_speed: Some(0.25),
        max_lvl_hp: None,
        weapon_type: Some(WeaponType::Rifle),
        deploy_limit: None,
        duration: None,
        crit_rate: Some(0.1),
        base_sync: None,
        max_sync: None,
    }
}

pub fn sample_skill(id: i32, item_id: i32) -> SkillRow {
    SkillRow {
        id,
        item_id,
        ingame_id: 500 + id,
        title_id: 600 + id,
        title: format!("Skill {id}"),
        description_template_id: 700 + id,
        description_template: "Deals #1 fire damage".into(),
        description: "Deals 120 fire damage".into(),
        damage_type: Some(DamageType::Fire),
    }
}

pub fn sample_record(ingame_id: i32) -> ItemRecord {
    ItemRecord {
        item: sample_item(ingame_id),
        properties: Some(sample_properties(ingame_id)),
        skills: vec![sample_skill(ingame_id * 10, ingame_id)],
    }
}
