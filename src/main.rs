mod command;
mod config;
mod controller;
mod effects;
mod error;
mod model;
mod registry;
mod scenes;
mod sink;
mod sound;
mod timer;
mod zone;

use command::{MisterLevel, SceneCue, SceneSlot, AUX_MAX_LEVEL, MIC_MAX_LEVEL, TABLE_MAX_LEVEL};
use config::{NetworkConfig, PanelConfig};
use eframe::egui;
use effects::EffectsPanel;
use log::{error, info};
use model::{ColorCode, GroupId, IntensityLevel, LockState, ZoneId};
use registry::{ColorSelection, LightRegistry};
use scenes::ScenePanel;
use sink::{CommandSink, OfflineSink, OscSink, UdpSink};
use sound::SoundPanel;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Instant;

fn main() -> eframe::Result<()> {
    env_logger::init();

    let config_path = config::user_config_path();
    let config = PanelConfig::load_or_default(&config_path);
    let (lights, status) = connect_lights(&config.network);
    let cues = connect_qlab(&config.network);
    let app = PanelApp::new(&config, lights, cues, status);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1600.0, 900.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Mosaic Panel",
        options,
        Box::new(move |_cc| Box::new(app)),
    )
}

fn connect_lights(network: &NetworkConfig) -> (Rc<dyn CommandSink>, String) {
    match UdpSink::new(&network.bind_address, &network.target_ip, network.target_port) {
        Ok(sink) => {
            let status = format!("Sending to {}", sink.target());
            (Rc::new(sink), status)
        }
        Err(e) => {
            error!("[NET] {:#}", e);
            (Rc::new(OfflineSink), format!("Network error: {}", e))
        }
    }
}

fn connect_qlab(network: &NetworkConfig) -> Rc<dyn CommandSink> {
    match OscSink::new(&network.bind_address, &network.qlab_ip, network.qlab_port) {
        Ok(sink) => Rc::new(sink),
        Err(e) => {
            error!("[NET] QLab: {:#}", e);
            Rc::new(OfflineSink)
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
enum SliderKey {
    Group(GroupId),
    Master(ZoneId),
    Aux,
    Pa,
    Mic(SceneSlot),
}

/// Everything the user did this frame, applied after drawing.
enum PanelAction {
    GroupReleased(GroupId, IntensityLevel),
    MasterReleased(ZoneId, IntensityLevel),
    Color(GroupId, ColorCode),
    ToggleFogger,
    FoggerLevel(IntensityLevel),
    Mister(bool),
    MisterLevel(MisterLevel),
    LedSigns(bool),
    Sound(bool),
    AuxLevel(u8),
    Pa(bool),
    PaLevel(IntensityLevel),
    StartScene(SceneCue),
    StopScene(SceneSlot),
    LightsOnly(bool),
    EmergencyStop,
    Mic(SceneSlot, bool),
    MicLevel(SceneSlot, u8),
}

struct PanelApp {
    registry: LightRegistry,
    effects: EffectsPanel,
    scenes: ScenePanel,
    sound: SoundPanel,
    // Values of sliders currently being dragged. Nothing is sent until release.
    drafts: HashMap<SliderKey, IntensityLevel>,
    status: String,
}

impl PanelApp {
    fn new(
        config: &PanelConfig,
        lights: Rc<dyn CommandSink>,
        cues: Rc<dyn CommandSink>,
        status: String,
    ) -> Self {
        Self {
            registry: LightRegistry::new(config, lights.clone()),
            effects: EffectsPanel::new(lights.clone()),
            scenes: ScenePanel::new(lights, cues.clone()),
            sound: SoundPanel::new(cues),
            drafts: HashMap::new(),
            status,
        }
    }

    fn apply(&mut self, action: PanelAction, now: Instant) {
        match action {
            PanelAction::GroupReleased(id, value) => {
                self.registry.slider_released(id, value as i32);
            }
            PanelAction::MasterReleased(zone, value) => {
                if let Some(settled) = self.registry.master_released(zone, value as i32) {
                    if let Some(aggregator) = self.registry.zone(zone) {
                        self.status = format!("{} at {}", aggregator.name(), settled);
                    }
                }
            }
            PanelAction::Color(id, color) => {
                if self.registry.select_color(id, color, now) == ColorSelection::Applied {
                    if let Some(group) = self.registry.group(id) {
                        self.status = format!("{} set to {}", group.name(), color);
                    }
                }
            }
            PanelAction::ToggleFogger => self.effects.toggle_fogger(),
            PanelAction::FoggerLevel(level) => self.effects.set_fogger_level(level),
            PanelAction::Mister(on) => self.effects.set_mister(on),
            PanelAction::MisterLevel(level) => self.effects.set_mister_level(level),
            PanelAction::LedSigns(on) => self.effects.set_led_signs(on),
            PanelAction::Sound(on) => self.sound.set_sound(on),
            PanelAction::AuxLevel(level) => self.sound.set_aux_level(level),
            PanelAction::Pa(on) => self.sound.set_pa(on),
            PanelAction::PaLevel(level) => self.sound.set_pa_level(level),
            PanelAction::StartScene(cue) => {
                self.scenes.start_scene(cue);
                self.status = format!("{} running", cue.name());
            }
            PanelAction::StopScene(SceneSlot::Abduction) => {
                self.scenes.stop_abduction(now);
            }
            PanelAction::StopScene(SceneSlot::Roaming) => {
                self.scenes.stop_roaming(self.effects.fogger_on(), now);
            }
            PanelAction::LightsOnly(on) => self.scenes.set_lights_only(on),
            PanelAction::EmergencyStop => self.scenes.emergency_stop(),
            PanelAction::Mic(slot, on) => self.scenes.set_mic(slot, on),
            PanelAction::MicLevel(slot, level) => self.scenes.set_mic_level(slot, level),
        }
    }
}

/// Draw a slider that only reports its value when the user lets go.
fn release_slider(
    ui: &mut egui::Ui,
    drafts: &mut HashMap<SliderKey, IntensityLevel>,
    key: SliderKey,
    current: IntensityLevel,
    max: IntensityLevel,
    vertical: bool,
) -> Option<IntensityLevel> {
    let mut value = drafts.get(&key).copied().unwrap_or(current);
    let mut slider = egui::Slider::new(&mut value, 0..=max);
    if vertical {
        slider = slider.vertical();
    }
    let response = ui.add(slider);

    if response.dragged() {
        drafts.insert(key, value);
        None
    } else if response.drag_released() || response.changed() {
        drafts.remove(&key);
        Some(value)
    } else {
        drafts.remove(&key);
        None
    }
}

fn swatch(color: ColorCode) -> egui::Color32 {
    let [r, g, b] = color.swatch();
    egui::Color32::from_rgb(r, g, b)
}

impl eframe::App for PanelApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        for id in self.registry.tick(now) {
            if let Some(group) = self.registry.group(id) {
                info!("[LIGHTS] {} color buttons re-enabled", group.name());
            }
        }
        self.scenes.tick(now);

        let mut actions = Vec::new();
        let registry = &self.registry;
        let effects = &self.effects;
        let scenes = &self.scenes;
        let sound = &self.sound;
        let drafts = &mut self.drafts;

        egui::TopBottomPanel::top("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Main Control");
                ui.separator();
                ui.label(egui::RichText::new(&self.status).size(16.0));
            });
        });

        egui::SidePanel::left("masters").resizable(false).show(ctx, |ui| {
            ui.heading("Masters");
            ui.horizontal(|ui| {
                for zone in registry.zones() {
                    ui.vertical(|ui| {
                        ui.label(egui::RichText::new(zone.name()).strong());
                        if let Some(value) = release_slider(
                            ui,
                            drafts,
                            SliderKey::Master(zone.id()),
                            zone.displayed_master(),
                            zone.master_max(),
                            true,
                        ) {
                            actions.push(PanelAction::MasterReleased(zone.id(), value));
                        }
                    });
                }
            });

            ui.separator();
            ui.heading("Effects");

            let fogger_text = if effects.fogger_on() { "Foggers ON" } else { "Foggers OFF" };
            if ui.selectable_label(effects.fogger_on(), fogger_text).clicked() {
                actions.push(PanelAction::ToggleFogger);
            }
            ui.horizontal(|ui| {
                for level in 1..=TABLE_MAX_LEVEL {
                    let selected = effects.fogger_on() && effects.fogger_level() == level;
                    if ui.selectable_label(selected, level.to_string()).clicked() {
                        actions.push(PanelAction::FoggerLevel(level));
                    }
                }
            });

            ui.add_space(8.0);
            let mister_text = if effects.mister_on() { "Misters ON" } else { "Misters OFF" };
            if ui.selectable_label(effects.mister_on(), mister_text).clicked() {
                actions.push(PanelAction::Mister(!effects.mister_on()));
            }
            ui.horizontal(|ui| {
                for level in [MisterLevel::Low, MisterLevel::High] {
                    let selected = effects.mister_level() == Some(level);
                    let button = egui::SelectableLabel::new(selected, level.label());
                    if ui.add_enabled(effects.mister_on(), button).clicked() {
                        actions.push(PanelAction::MisterLevel(level));
                    }
                }
            });

            ui.add_space(8.0);
            let led_text = if effects.led_signs_on() { "LED Signs ON" } else { "LED Signs OFF" };
            if ui.selectable_label(effects.led_signs_on(), led_text).clicked() {
                actions.push(PanelAction::LedSigns(!effects.led_signs_on()));
            }

            ui.separator();
            ui.heading("Sound");
            ui.horizontal(|ui| {
                if ui.selectable_label(sound.sound_on(), "Sound").clicked() {
                    actions.push(PanelAction::Sound(!sound.sound_on()));
                }
                if ui.selectable_label(sound.pa_on(), "PA").clicked() {
                    actions.push(PanelAction::Pa(!sound.pa_on()));
                }
            });
            ui.horizontal(|ui| {
                ui.add_enabled_ui(sound.sound_on(), |ui| {
                    if let Some(value) =
                        release_slider(ui, drafts, SliderKey::Aux, sound.aux_level(), AUX_MAX_LEVEL, true)
                    {
                        actions.push(PanelAction::AuxLevel(value));
                    }
                });
                ui.add_enabled_ui(sound.pa_on(), |ui| {
                    if let Some(value) =
                        release_slider(ui, drafts, SliderKey::Pa, sound.pa_level(), TABLE_MAX_LEVEL, true)
                    {
                        actions.push(PanelAction::PaLevel(value));
                    }
                });
            });
        });

        egui::TopBottomPanel::bottom("scenes").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Scenes");
                if ui.button("Stop All Cues").clicked() {
                    actions.push(PanelAction::EmergencyStop);
                }
                if ui.selectable_label(scenes.lights_only(), "Lights Only").clicked() {
                    actions.push(PanelAction::LightsOnly(!scenes.lights_only()));
                }
            });
            ui.horizontal(|ui| {
                for slot in [SceneSlot::Abduction, SceneSlot::Roaming] {
                    ui.group(|ui| {
                        ui.vertical(|ui| {
                            ui.label(egui::RichText::new(slot.label()).strong());
                            ui.horizontal(|ui| {
                                for cue in SceneCue::ALL.into_iter().filter(|c| c.slot() == slot) {
                                    let running = scenes.running(slot) == Some(cue);
                                    if ui.selectable_label(running, cue.name()).clicked() && !running {
                                        actions.push(PanelAction::StartScene(cue));
                                    }
                                }
                                if scenes.running(slot).is_some() && ui.button("Stop").clicked() {
                                    actions.push(PanelAction::StopScene(slot));
                                }
                            });
                            if let Some(text) = scenes.confirmation(slot) {
                                ui.label(text);
                            }
                            ui.horizontal(|ui| {
                                let mic_text = if scenes.mic_on(slot) { "Mic On" } else { "Mic Off" };
                                if ui.selectable_label(scenes.mic_on(slot), mic_text).clicked() {
                                    actions.push(PanelAction::Mic(slot, !scenes.mic_on(slot)));
                                }
                                ui.add_enabled_ui(scenes.mic_on(slot), |ui| {
                                    if let Some(value) = release_slider(
                                        ui,
                                        drafts,
                                        SliderKey::Mic(slot),
                                        scenes.mic_level(slot),
                                        MIC_MAX_LEVEL,
                                        false,
                                    ) {
                                        actions.push(PanelAction::MicLevel(slot, value));
                                    }
                                });
                            });
                        });
                    });
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                for group in registry.groups() {
                    ui.group(|ui| {
                        ui.horizontal(|ui| {
                            ui.label(egui::RichText::new(group.name()).size(18.0).strong());
                            ui.label(egui::RichText::new(group.prefix()).weak());
                            if let Some(zone) = group.zone() {
                                ui.label(format!("({})", zone));
                            }
                            if group.lock_state() == LockState::LockedAtZero {
                                ui.label(egui::RichText::new("LOCKED").color(egui::Color32::RED));
                            }
                        });

                        if group.is_color_selectable() {
                            let enabled = registry.color_input_enabled(group.id());
                            ui.horizontal(|ui| {
                                for color in ColorCode::ALL {
                                    let selected = group.color() == color;
                                    let mut button = egui::Button::new(if selected { "●" } else { " " })
                                        .fill(swatch(color))
                                        .min_size(egui::vec2(48.0, 48.0));
                                    if selected {
                                        button = button.stroke(egui::Stroke::new(4.0, egui::Color32::from_gray(0x33)));
                                    }
                                    // The selected colour stays live during the debounce window.
                                    if ui.add_enabled(enabled || selected, button).clicked() {
                                        actions.push(PanelAction::Color(group.id(), color));
                                    }
                                }
                            });
                        }

                        if let Some(value) = release_slider(
                            ui,
                            drafts,
                            SliderKey::Group(group.id()),
                            group.current_intensity(),
                            group.max_intensity(),
                            false,
                        ) {
                            actions.push(PanelAction::GroupReleased(group.id(), value));
                        }
                    });
                }
            });
        });

        for action in actions {
            self.apply(action, now);
        }

        let now = Instant::now();
        let next = [self.registry.next_deadline(now), self.scenes.next_deadline(now)]
            .into_iter()
            .flatten()
            .min();
        if let Some(wait) = next {
            ctx.request_repaint_after(wait);
        }
    }
}
