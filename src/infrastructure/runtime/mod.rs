//! Runtime - 播放循环

mod player_loop;

pub use player_loop::PlayerLoop;
