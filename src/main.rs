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

//! Desktop viewer for S-111 surface-current forecasts over NOAA charts.

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

mod config;
mod map;
mod network;
mod ui;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use eframe::egui;
use log::{error, info, warn};
use ofs_core::{enc_source, Command, IdentifyState, LayerId, MapSurface, RegionCatalog, Viewer};

use config::AppConfig;
use map::view::ScreenProjection;
use map::{Basemap, MapView};
use network::RestChartIndex;
use ui::{ControlAction, ControlPanel, ControlState};

/// Repaint cadence while an identify query is outstanding
const QUERY_REPAINT_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Parser, Debug)]
#[command(name = "s111-viewer", version, about = "S-111 surface current forecast viewer")]
struct Args {
    /// Region to open at startup (e.g. tbofs, cbofs)
    #[arg(long)]
    region: Option<String>,

    /// Background basemap
    #[arg(long, value_enum)]
    basemap: Option<Basemap>,

    /// Milliseconds between animation frames
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Start with the ENC overlay hidden
    #[arg(long)]
    no_enc: bool,

    /// Start animating immediately
    #[arg(long)]
    play: bool,

    /// Print the configuration file path and exit
    #[arg(long)]
    print_config_path: bool,
}

impl Args {
    /// Startup settings: the stored config with command-line overrides
    fn apply(&self, config: &AppConfig) -> AppConfig {
        let mut startup = config.clone();
        if let Some(region) = &self.region {
            startup.default_region.clone_from(region);
        }
        if let Some(basemap) = self.basemap {
            startup.basemap = basemap;
        }
        if let Some(interval) = self.interval_ms {
            startup.animation_interval_ms = interval;
        }
        if self.no_enc {
            startup.show_enc = false;
        }
        if self.play {
            startup.autoplay = true;
        }
        startup
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if args.print_config_path {
        println!("{}", AppConfig::get_config_path()?.display());
        return Ok(());
    }

    let config = AppConfig::load().unwrap_or_else(|e| {
        warn!("Failed to load config, using defaults: {}", e);
        AppConfig::default()
    });
    let startup = args.apply(&config);
    let catalog = Arc::new(startup.catalog()?);
    info!("Loaded {} forecast regions", catalog.len());

    // Timers and identify queries are spawned from the UI thread
    let runtime = tokio::runtime::Runtime::new()?;
    let _guard = runtime.enter();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 800.0])
            .with_title("S-111 Surface Currents"),
        ..Default::default()
    };

    eframe::run_native(
        "S-111 Surface Currents",
        options,
        Box::new(move |cc| Ok(Box::new(ChartViewerApp::new(&cc.egui_ctx, config, &startup, catalog)))),
    )?;
    Ok(())
}

struct ChartViewerApp {
    viewer: Viewer<RestChartIndex>,
    map: MapView,
    enc_layer: LayerId,
    controls: ControlPanel,
    /// Persisted settings; command-line overrides are not written back
    config: AppConfig,
    forecast_opacity: f32,
    projection: Option<ScreenProjection>,
}

impl ChartViewerApp {
    fn new(ctx: &egui::Context, config: AppConfig, startup: &AppConfig, catalog: Arc<RegionCatalog>) -> Self {
        let service = Arc::new(RestChartIndex::new(startup.chart_index_url.clone()));
        let mut viewer = Viewer::new(Arc::clone(&catalog), service, startup.viewer_config());
        let repaint = ctx.clone();
        viewer.set_wake(Arc::new(move || repaint.request_repaint()));

        let region = if catalog.contains(&startup.default_region) {
            startup.default_region.clone()
        } else {
            warn!("Unknown startup region {}, using default", startup.default_region);
            catalog.default_region().id.clone()
        };
        let home = catalog.region(&region).map_or(catalog.default_region().center, |r| r.center);

        let mut map = MapView::new(ctx, startup.basemap, home);
        // ENC goes in first so the forecast draws above it
        let enc_layer = map.add_layer(enc_source());
        map.set_visible(enc_layer, startup.show_enc);

        let mut app = Self {
            viewer,
            map,
            enc_layer,
            controls: ControlPanel::new(),
            config,
            forecast_opacity: startup.forecast_opacity,
            projection: None,
        };

        app.dispatch(Command::SelectRegion(region));
        if !startup.show_forecast {
            app.dispatch(Command::SetForecastVisible(false));
        }
        if startup.autoplay {
            app.dispatch(Command::TogglePlay);
        }
        app
    }

    fn dispatch(&mut self, command: Command) {
        let binds_region = matches!(command, Command::SelectRegion(_));
        self.viewer.dispatch(command, &mut self.map);
        if binds_region {
            if let Some(layer) = self.viewer.binding().layer() {
                self.map.set_opacity(layer, self.forecast_opacity);
            }
        }
    }

    fn persist(&self) {
        if let Err(e) = self.config.save() {
            error!("Failed to save config: {}", e);
        }
    }

    fn apply_action(&mut self, action: ControlAction) {
        match action {
            ControlAction::Viewer(command) => {
                match &command {
                    Command::SelectRegion(id) => self.config.default_region.clone_from(id),
                    Command::SetForecastVisible(visible) => self.config.show_forecast = *visible,
                    _ => {}
                }
                self.dispatch(command);
            }
            ControlAction::SetBasemap(basemap) => {
                self.map.set_basemap(basemap);
                self.config.basemap = basemap;
            }
            ControlAction::SetEncVisible(visible) => {
                self.map.set_visible(self.enc_layer, visible);
                self.config.show_enc = visible;
            }
        }
        self.persist();
    }
}

impl eframe::App for ChartViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.viewer.drain(&mut self.map);

        let actions = {
            let series = self.viewer.series();
            let state = ControlState {
                region: self.viewer.binding().region(),
                basemap: self.map.basemap(),
                enc_visible: self.map.is_visible(self.enc_layer),
                forecast_visible: self.viewer.binding().is_visible(&self.map),
                playing: series.is_playing(),
                valid_time: series.display_label(),
                frame: series.frame_index(),
                frame_count: series.frame_count(),
            };
            self.controls.render(ctx, self.viewer.catalog(), &state)
        };
        for action in actions {
            self.apply_action(action);
        }

        if let Some(popup) = self.viewer.identify().popup() {
            if let Some(command) = ui::show_popup(ctx, &popup, self.projection.as_ref()) {
                self.dispatch(command);
            }
        }

        let clicked = egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                let highlight = self.viewer.identify().highlight().feature();
                let interaction = self.map.show(ui, highlight);
                self.projection = interaction.projection;
                interaction.clicked
            })
            .inner;
        if let Some(point) = clicked {
            self.dispatch(Command::MapClicked(point));
        }

        if self.viewer.identify().state() == IdentifyState::Querying {
            ctx.request_repaint_after(QUERY_REPAINT_INTERVAL);
        }
    }
}
