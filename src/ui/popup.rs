// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Identify popup: product tabs over the clicked cell's attributes.

use egui::{Color32, RichText};
use ofs_core::{Command, Popup, ProductTab};

use crate::map::view::ScreenProjection;

/// Offset so the window doesn't cover the clicked point
const ANCHOR_OFFSET: egui::Vec2 = egui::vec2(12.0, 12.0);

/// Render the popup anchored at the clicked point; returns a tab change or close
pub fn show_popup(ctx: &egui::Context, popup: &Popup, projection: Option<&ScreenProjection>) -> Option<Command> {
    let mut command = None;
    let mut open = true;

    let mut window = egui::Window::new("Chart cell")
        .id(egui::Id::new("identify_popup"))
        .open(&mut open)
        .collapsible(false)
        .resizable(false)
        .default_width(320.0);
    if let Some(projection) = projection {
        window = window.current_pos(projection.to_screen(popup.anchor) + ANCHOR_OFFSET);
    }

    window.show(ctx, |ui| {
        ui.horizontal(|ui| {
            for tab in ProductTab::ALL {
                if ui.selectable_label(popup.active_tab == tab, tab.title()).clicked() && popup.active_tab != tab {
                    command = Some(Command::SelectTab(tab));
                }
            }
        });
        ui.separator();

        if popup.table.is_empty() {
            ui.label(RichText::new("No data for this product").color(Color32::GRAY).italics());
            return;
        }

        egui::Grid::new("identify_attributes")
            .num_columns(2)
            .striped(true)
            .show(ui, |ui| {
                for (name, value) in &popup.table.rows {
                    ui.label(RichText::new(name).strong());
                    ui.label(value);
                    ui.end_row();
                }
            });
    });

    if !open {
        command = Some(Command::ClosePopup);
    }
    command
}
