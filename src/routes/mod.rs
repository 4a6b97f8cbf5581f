mod channels;
mod health_check;
mod users;

pub use channels::{channel_profile, watch_history};
pub use health_check::health_check;
pub use users::{
    change_password, current_user, login, logout, refresh_access_token, register,
    update_account_details, update_avatar, update_cover_image,
};
