use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "damage_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DamageType {
    Physical,
    Fire,
    Ice,
    Lightning,
    Light,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "weapon_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum WeaponType {
    Pistol,
    Shotgun,
    Rifle,
    Sniper,
    Launcher,
    Melee,
    Throwable,
}

#[derive(Debug, Clone, FromRow)]
pub struct ItemRow {
    pub id: i32,
    pub ingame_id: i32,
    pub title_id: i32,
    pub title: String,
    pub image_id: i32,
    pub image_url: String,
    pub damage_type: Option<DamageType>,
    pub rarity: i32,
}

/// One-to-one with `item`, joined on `item.ingame_id`.
#[derive(Debug, Clone, FromRow)]
pub struct PropertiesRow {
    pub id: i32,
    pub item_id: i32,
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

#[derive(Debug, Clone, FromRow)]
pub struct SkillRow {
    pub id: i32,
    pub item_id: i32,
    pub ingame_id: i32,
    pub title_id: i32,
    pub title: String,
    pub description_template_id: i32,
    pub description_template: String,
    pub description: String,
    pub damage_type: Option<DamageType>,
}

/// An item with its properties and skills loaded.
#[derive(Debug, Clone)]
pub struct ItemRecord {
    pub item: ItemRow,
    pub properties: Option<PropertiesRow>,
    pub skills: Vec<SkillRow>,
}
