//! The per-voice operator graph ("particle").

/*
Particle Evaluation
===================

A particle is seven operators plus four spatial chains, one per carrier.
Everything is allocated when the particle is built; rendering only touches
pre-allocated state.

Per sample, in index order:

    for op in 0..7:
        modulation = Σ outputs[parent]       (parents always have lower indices)
        outputs[op] = operator[op].tick(modulation)

    for each carrier slot s (carrier = OP4, OP5, OP6, OP7):
        (l, r) = spatial[s].process(outputs[carrier] * velocity * pressure_gain)
        frame[2s]     += l
        frame[2s + 1] += r

So OP1 is always computed before OP2/OP3, and those before the carriers,
within the same sample. Modulators are never written to the output.

    pressure_gain = 1 + pressure_depth * pressure²


Lifetime
--------

`is_silent` is the voice pool's only reclamation signal. It is true only
when EVERY operator is idle: no amplitude envelope running and no delayed
start pending. One carrier finishing early does not free the voice.

Echoes still circulating in the delay lines are cut when the voice is
reclaimed; the next fresh trigger clears them.
*/

use std::sync::Arc;

use crate::{
    config::EngineConfig,
    dsp::oscillator::WaveTables,
    graph::{
        node::{GraphNode, RenderCtx},
        operator::{Operator, OperatorFrame},
        routing::Routing,
        spatial::CarrierSpatial,
    },
    patch::{GlobalParam, GlobalParams, ParamKey, Patch},
    CARRIER_COUNT, OPERATOR_COUNT, OUTPUT_CHANNELS,
};

pub struct Particle {
    operators: [Operator; OPERATOR_COUNT],
    spatial: [CarrierSpatial; CARRIER_COUNT],
    routing: Routing,
    tables: Arc<WaveTables>,
    globals: GlobalParams,
    sample_rate: f32,
    velocity: f32,
    pressure: f32,
    gate: bool,
    /// Current sample's operator outputs.
    outputs: [f32; OPERATOR_COUNT],
}

impl Particle {
    pub fn new(
        patch: &Patch,
        routing: Routing,
        tables: Arc<WaveTables>,
        config: &EngineConfig,
    ) -> Self {
        let delay_capacity = config.delay_capacity();
        let carriers = *routing.carriers();
        Self {
            operators: std::array::from_fn(|i| {
                Operator::new(patch.operators[i], config.ramp_retrigger)
            }),
            spatial: std::array::from_fn(|slot| {
                CarrierSpatial::new(
                    &patch.operators[carriers[slot]],
                    config.sample_rate,
                    delay_capacity,
                )
            }),
            routing,
            tables,
            globals: patch.globals,
            sample_rate: config.sample_rate,
            velocity: 1.0,
            pressure: 0.0,
            gate: false,
            outputs: [0.0; OPERATOR_COUNT],
        }
    }

    pub fn operator(&self, index: usize) -> Option<&Operator> {
        self.operators.get(index)
    }

    pub fn pressure(&self) -> f32 {
        self.pressure
    }

    fn carrier_gain(&self) -> f32 {
        let pressure = self.pressure;
        self.velocity * (1.0 + self.globals.pressure_depth * pressure * pressure)
    }
}

impl GraphNode for Particle {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        let frame_params = OperatorFrame {
            fundamental: ctx.frequency,
            modulation_gain: self.globals.modulation_gain,
            dt: 1.0 / self.sample_rate,
            nyquist: self.sample_rate * 0.5,
        };
        let carrier_gain = self.carrier_gain();
        let carriers = *self.routing.carriers();

        for frame in out.chunks_exact_mut(OUTPUT_CHANNELS) {
            for op in 0..OPERATOR_COUNT {
                let modulation: f32 = self
                    .routing
                    .parents(op)
                    .iter()
                    .map(|&parent| self.outputs[parent])
                    .sum();
                self.outputs[op] = self.operators[op].tick(modulation, &frame_params, &self.tables);
            }

            for (slot, &carrier) in carriers.iter().enumerate() {
                let (left, right) =
                    self.spatial[slot].process(self.outputs[carrier] * carrier_gain, frame_params.dt);
                frame[slot * 2] += left;
                frame[slot * 2 + 1] += right;
            }
        }
    }

    fn note_on(&mut self, ctx: &RenderCtx) {
        if self.is_silent() {
            for spatial in self.spatial.iter_mut() {
                spatial.reset();
            }
        }
        // Pressure belongs to the key that was struck, never to the slot
        self.pressure = 0.0;
        self.velocity = ctx.velocity.clamp(0.0, 1.0);
        self.gate = true;
        for op in self.operators.iter_mut() {
            op.trigger();
        }
    }

    fn note_off(&mut self, _ctx: &RenderCtx) {
        self.gate = false;
        for op in self.operators.iter_mut() {
            op.release();
        }
    }

    fn apply_patch(&mut self, patch: &Patch) {
        for (op, params) in self.operators.iter_mut().zip(&patch.operators) {
            op.set_params(params);
        }
        for (spatial, &carrier) in self.spatial.iter_mut().zip(self.routing.carriers()) {
            spatial.set_params(&patch.operators[carrier]);
        }
        self.globals = patch.globals;
    }

    fn set_param(&mut self, key: ParamKey, value: f32) {
        let Some(op) = self.operators.get_mut(key.operator()) else {
            return;
        };
        op.set_param(key.param(), value);
        if key.param().is_spatial() {
            if let Some(slot) = self.routing.carrier_slot(key.operator()) {
                self.spatial[slot].set_params(op.params());
            }
        }
    }

    fn set_global(&mut self, param: GlobalParam, value: f32) {
        self.globals.set(param, value);
    }

    fn set_pressure(&mut self, pressure: f32) {
        if pressure.is_finite() {
            self.pressure = pressure.clamp(0.0, 1.0);
        }
    }

    fn is_silent(&self) -> bool {
        self.operators.iter().all(Operator::is_idle)
    }

    fn is_sustaining(&self) -> bool {
        self.gate && self.operators.iter().all(Operator::is_settled)
    }
}
