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

//! Top control bar: region, basemap, layer toggles and playback.

use egui::{Color32, RichText};
use ofs_core::{Command, RegionCatalog};

use crate::map::Basemap;

const ACCENT: Color32 = Color32::from_rgb(100, 180, 220);

/// A user action taken in the control bar
#[derive(Debug, Clone)]
pub enum ControlAction {
    /// Forwarded to the viewer core unchanged
    Viewer(Command),
    SetBasemap(Basemap),
    SetEncVisible(bool),
}

/// Everything the control bar displays for one frame
#[derive(Debug, Clone)]
pub struct ControlState<'a> {
    pub region: Option<&'a str>,
    pub basemap: Basemap,
    pub enc_visible: bool,
    pub forecast_visible: bool,
    pub playing: bool,
    pub valid_time: String,
    pub frame: u32,
    pub frame_count: u32,
}

#[derive(Debug, Default)]
pub struct ControlPanel;

impl ControlPanel {
    pub fn new() -> Self {
        Self
    }

    /// Render the bar and collect what the user changed
    pub fn render(&mut self, ctx: &egui::Context, catalog: &RegionCatalog, state: &ControlState<'_>) -> Vec<ControlAction> {
        let mut actions = Vec::new();

        egui::TopBottomPanel::top("controls").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(RichText::new("◈ S-111").color(ACCENT).strong());
                ui.separator();

                let selected = state
                    .region
                    .and_then(|id| catalog.region(id))
                    .map_or("Select region", |r| r.label.as_str());
                egui::ComboBox::from_id_salt("region")
                    .selected_text(selected)
                    .show_ui(ui, |ui| {
                        for region in catalog.regions() {
                            let is_current = state.region == Some(region.id.as_str());
                            if ui.selectable_label(is_current, &region.label).clicked() && !is_current {
                                actions.push(ControlAction::Viewer(Command::SelectRegion(region.id.clone())));
                            }
                        }
                    });

                egui::ComboBox::from_id_salt("basemap")
                    .selected_text(state.basemap.label())
                    .show_ui(ui, |ui| {
                        for basemap in Basemap::ALL {
                            if ui.selectable_label(state.basemap == basemap, basemap.label()).clicked()
                                && state.basemap != basemap
                            {
                                actions.push(ControlAction::SetBasemap(basemap));
                            }
                        }
                    });

                ui.separator();

                let mut enc = state.enc_visible;
                if ui.checkbox(&mut enc, "ENC").changed() {
                    actions.push(ControlAction::SetEncVisible(enc));
                }
                let mut forecast = state.forecast_visible;
                if ui.checkbox(&mut forecast, "Surface currents").changed() {
                    actions.push(ControlAction::Viewer(Command::SetForecastVisible(forecast)));
                }

                ui.separator();

                let play_label = if state.playing { "⏸ Pause" } else { "▶ Play" };
                let play = ui.add_enabled(state.region.is_some(), egui::Button::new(play_label));
                if play.on_hover_text("Animate the forecast").clicked() {
                    actions.push(ControlAction::Viewer(Command::TogglePlay));
                }

                if state.region.is_some() {
                    ui.label(RichText::new(&state.valid_time).monospace());
                    ui.label(
                        RichText::new(format!("{}/{}", state.frame + 1, state.frame_count))
                            .color(Color32::GRAY)
                            .size(11.0),
                    );
                }
            });
        });

        actions
    }
}
