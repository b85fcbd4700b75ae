mod equipment;
mod food;
mod helpers;
mod history;
mod profile;
mod recommend;

pub(crate) use equipment::{cmd_equipment_add, cmd_equipment_delete, cmd_equipment_list};
pub(crate) use food::{cmd_food_add, cmd_food_delete, cmd_food_list};
pub(crate) use helpers::parse_height;
pub(crate) use history::cmd_history;
pub(crate) use profile::{
    ProfileUpdate, cmd_profile_rename, cmd_profile_set, cmd_profile_show, cmd_profile_weight,
    cmd_users,
};
pub(crate) use recommend::{
    cmd_recommend_both, cmd_recommend_dinner, cmd_recommend_recipe, cmd_recommend_workout,
};
