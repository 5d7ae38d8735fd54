use std::collections::HashMap;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;

use super::repo_types::{ItemRecord, ItemRow, PropertiesRow, SkillRow};

#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// Page of items ordered by in-game id, relations loaded.
    async fn list(&self, skip: i64, limit: i64) -> anyhow::Result<Vec<ItemRecord>>;
    async fn count(&self) -> anyhow::Result<i64>;
    async fn get_by_ingame_id(&self, ingame_id: i32) -> anyhow::Result<Option<ItemRecord>>;
}

const ITEM_COLUMNS: &str =
    "id, ingame_id, title_id, title, image_id, image_url, damage_type, rarity";
const PROPERTIES_COLUMNS: &str = "id, item_id, max_lvl, cost, max_lvl_damage, max_lvl_ammo, \
     max_lvl_atk_speed, max_lvl_hp, weapon_type, deploy_limit, duration, crit_rate, \
     base_sync, max_sync";
const SKILL_COLUMNS: &str = "id, item_id, ingame_id, title_id, title, description_template_id, \
     description_template, description, damage_type";

#[derive(Clone)]
pub struct PgItemRepository {
    db: PgPool,
}

impl PgItemRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Loads properties and skills for `items` with one query per table.
    async fn attach_relations(&self, items: Vec<ItemRow>) -> anyhow::Result<Vec<ItemRecord>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i32> = items.iter().map(|i| i.ingame_id).collect();

        let properties = sqlx::query_as::<_, PropertiesRow>(&format!(
            "SELECT {PROPERTIES_COLUMNS} FROM properties WHERE item_id = ANY($1)"
        ))
        .bind(&ids)
        .fetch_all(&self.db)
        .await
        .context("load item properties")?;

        let skills = sqlx::query_as::<_, SkillRow>(&format!(
            "SELECT {SKILL_COLUMNS} FROM skill WHERE item_id = ANY($1) ORDER BY id"
        ))
        .bind(&ids)
        .fetch_all(&self.db)
        .await
        .context("load item skills")?;

        Ok(group_relations(items, properties, skills))
    }
}

pub(crate) fn group_relations(
    items: Vec<ItemRow>,
    properties: Vec<PropertiesRow>,
    skills: Vec<SkillRow>,
) -> Vec<ItemRecord> {
    let mut props_by_item: HashMap<i32, PropertiesRow> =
        properties.into_iter().map(|p| (p.item_id, p)).collect();
    let mut skills_by_item: HashMap<i32, Vec<SkillRow>> = HashMap::new();
    for skill in skills {
        skills_by_item.entry(skill.item_id).or_default().push(skill);
    }

    items
        .into_iter()
        .map(|item| ItemRecord {
            properties: props_by_item.remove(&item.ingame_id),
            skills: skills_by_item.remove(&item.ingame_id).unwrap_or_default(),
            item,
        })
        .collect()
}

#[async_trait]
impl ItemRepository for PgItemRepository {
    async fn list(&self, skip: i64, limit: i64) -> anyhow::Result<Vec<ItemRecord>> {
        let items = sqlx::query_as::<_, ItemRow>(&format!(
            r#"
            SELECT {ITEM_COLUMNS}
            FROM item
            ORDER BY ingame_id
            LIMIT $1 OFFSET $2
            "#
        ))
        .bind(limit)
        .bind(skip)
        .fetch_all(&self.db)
        .await
        .context("list items")?;
        self.attach_relations(items).await
    }

    async fn count(&self) -> anyhow::Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM item")
            .fetch_one(&self.db)
            .await
            .context("count items")?;
        Ok(count)
    }

    async fn get_by_ingame_id(&self, ingame_id: i32) -> anyhow::Result<Option<ItemRecord>> {
        let item = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM item WHERE ingame_id = $1"
        ))
        .bind(ingame_id)
        .fetch_optional(&self.db)
        .await
        .context("get item by ingame id")?;

        let Some(item) = item else {
            return Ok(None);
        };
        Ok(self.attach_relations(vec![item]).await?.pop())
    }
}
