//! Transient notifications shown in the bottom-right corner.

use egui::{Align2, Context, RichText};

use crate::ui::theme;

const TOAST_SECONDS: f64 = 5.0;
const MAX_TOASTS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub level: ToastLevel,
    pub text: String,
    /// Set on the first frame the toast is drawn.
    shown_at: Option<f64>,
}

/// Notification context handed to whoever needs to report to the user.
#[derive(Debug, Default)]
pub struct Toasts {
    items: Vec<Toast>,
}

impl Toasts {
    pub fn info(&mut self, text: impl Into<String>) {
        self.push(ToastLevel::Info, text.into());
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.push(ToastLevel::Error, text.into());
    }

    fn push(&mut self, level: ToastLevel, text: String) {
        tracing::debug!(?level, %text, "toast");
        self.items.push(Toast {
            level,
            text,
            shown_at: None,
        });
        if self.items.len() > MAX_TOASTS {
            self.items.remove(0);
        }
    }

    pub fn items(&self) -> &[Toast] {
        &self.items
    }

    /// Stamp new toasts with `now` and drop the expired ones.
    pub fn expire(&mut self, now: f64) {
        for toast in &mut self.items {
            toast.shown_at.get_or_insert(now);
        }
        self.items
            .retain(|t| t.shown_at.map_or(true, |at| now - at < TOAST_SECONDS));
    }

    pub fn show(&mut self, ctx: &Context) {
        self.expire(ctx.input(|i| i.time));
        if self.items.is_empty() {
            return;
        }
        egui::Area::new(egui::Id::new("toasts"))
            .anchor(Align2::RIGHT_BOTTOM, [-12.0, -36.0])
            .interactable(false)
            .show(ctx, |ui| {
                for toast in &self.items {
                    let color = match toast.level {
                        ToastLevel::Info => theme::ACCENT,
                        ToastLevel::Error => theme::ERROR_TEXT,
                    };
                    egui::Frame::popup(ui.style())
                        .stroke(egui::Stroke::new(1.0, color))
                        .show(ui, |ui| {
                            ui.set_max_width(360.0);
                            ui.label(RichText::new(&toast.text).color(theme::TEXT_PRIMARY));
                        });
                    ui.add_space(4.0);
                }
            });
        // Keep frames coming so toasts expire without input.
        ctx.request_repaint_after(std::time::Duration::from_millis(250));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toasts_expire_after_their_lifetime() {
        let mut toasts = Toasts::default();
        toasts.error("Delete failed");
        toasts.expire(10.0);
        assert_eq!(toasts.items().len(), 1);
        toasts.info("Exported");
        toasts.expire(14.0);
        assert_eq!(toasts.items().len(), 2);
        toasts.expire(15.5);
        assert_eq!(toasts.items().len(), 1);
        assert_eq!(toasts.items()[0].text, "Exported");
    }

    #[test]
    fn only_the_newest_are_kept() {
        let mut toasts = Toasts::default();
        for i in 0..8 {
            toasts.info(format!("n{i}"));
        }
        assert_eq!(toasts.items().len(), MAX_TOASTS);
        assert_eq!(toasts.items()[0].text, "n3");
    }
}
