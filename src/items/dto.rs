use serde::{Deserialize, Serialize};

use super::repo_types::{DamageType, ItemRecord, PropertiesRow, SkillRow, WeaponType};

#[derive(Debug, Serialize, Deserialize)]
pub struct PropertiesPublic {
    pub id: i32,
    pub max_lvl: i32,
    pub cost: Option<i32>,
    pub max_lvl_damage: Option<i32>,
    pub max_lvl_ammo: Option<i32>,
    pub max_lvl_atk_speed: Option<f64>,
    pub max_lvl_hp: Option<i32>,
    pub weapon_type: Option<WeaponType>,
    pub deploy_limit: Option<i32>,
    pub duration: Option<f64>,
    pub crit_rate: Option<f64>,
    pub base_sync: Option<i32>,
    pub max_sync: Option<i32>,
}

impl From<PropertiesRow> for PropertiesPublic {
    fn from(p: PropertiesRow) -> Self {
        Self {
            id: p.id,
            max_lvl: p.max_lvl,
            cost: p.cost,
            max_lvl_damage: p.max_lvl_damage,
            max_lvl_ammo: p.max_lvl_ammo,
            max_lvl_atk_speed: p.max_lvl_atk_speed,
            max_lvl_hp: p.max_lvl_hp,
            weapon_type: p.weapon_type,
            deploy_limit: p.deploy_limit,
            duration: p.duration,
            crit_rate: p.crit_rate,
            base_sync: p.base_sync,
            max_sync: p.max_sync,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SkillPublic {
    pub id: i32,
    pub ingame_id: i32,
    pub title_id: i32,
    pub title: String,
    pub description_template_id: i32,
    pub description_template: String,
    pub description: String,
    pub damage_type: Option<DamageType>,
}

impl From<SkillRow> for SkillPublic {
    fn from(s: SkillRow) -> Self {
        Self {
            id: s.id,
            ingame_id: s.ingame_id,
            title_id: s.title_id,
            title: s.title,
            description_template_id: s.description_template_id,
            description_template: s.description_template,
            description: s.description,
            damage_type: s.damage_type,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ItemPublic {
    pub id: i32,
    pub ingame_id: i32,
    pub title_id: i32,
    pub title: String,
    pub image_id: i32,
    pub image_url: String,
    pub damage_type: Option<DamageType>,
    pub rarity: i32,
    pub properties: Option<PropertiesPublic>,
    pub skills: Vec<SkillPublic>,
}

impl From<ItemRecord> for ItemPublic {
    fn from(r: ItemRecord) -> Self {
        Self {
            id: r.item.id,
            ingame_id: r.item.ingame_id,
            title_id: r.item.title_id,
            title: r.item.title,
            image_id: r.item.image_id,
            image_url: r.item.image_url,
            damage_type: r.item.damage_type,
            rarity: r.item.rarity,
            properties: r.properties.map(Into::into),
            skills: r.skills.into_iter().map(Into::into).collect(),
        }
    }
}

/// `count` is the number of rows in `data`; `total` counts every item.
#[derive(Debug, Serialize, Deserialize)]
pub struct ItemsPublic {
    pub data: Vec<ItemPublic>,
    pub count: usize,
    pub total: i64,
}
