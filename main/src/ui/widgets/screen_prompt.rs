use std::hash::Hash;

use eframe::{
    egui::{Area, Context, Frame, Id, Order, Sense, Ui},
    emath::{Align2, Pos2, Vec2},
    epaint::{Color32, Rounding},
};

use crate::ui::THEME;

/// A modal prompt: dims the whole window, swallows clicks behind it and centers its contents
pub struct ScreenPrompt {
    id: Id,
    prompt_frame: Frame,
    bg_overlay_color: Color32,
}

impl ScreenPrompt {
    pub fn new(id_salt: impl Hash) -> Self {
        Self {
            id: Id::new(id_salt),
            prompt_frame: THEME.prompt_frame,
            bg_overlay_color: Color32::from_black_alpha(200),
        }
    }

    pub fn show<R>(self, ctx: &Context, add_contents: impl FnOnce(&mut Ui) -> R) -> R {
        Area::new(self.id.with("prompt_bg"))
            .fixed_pos(Pos2::ZERO)
            .order(Order::Middle)
            .show(ctx, |ui| {
                let screen_rect = ctx.screen_rect();

                ui.allocate_response(screen_rect.size(), Sense::click());
                ui.painter()
                    .rect_filled(screen_rect, Rounding::ZERO, self.bg_overlay_color);
            });

        Area::new(self.id.with("prompt_centered"))
            .anchor(Align2::CENTER_CENTER, Vec2::ZERO)
            .order(Order::Foreground)
            .show(ctx, |ui| {
                ui.set_max_width(ctx.screen_rect().width() * 0.8);
                self.prompt_frame.show(ui, add_contents).inner
            })
            .inner
    }
}
