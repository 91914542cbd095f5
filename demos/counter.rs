//! A free-running 4-bit counter: a register feeds an adder that feeds
//! the register back, with a switch holding the increment at one.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use modsim::{ModuleId, ModuleKind, PortRef, SimContext, Ticker, Vec2, WirePath};

fn port(cx: &SimContext, m: ModuleId, label: &str) -> Result<PortRef, String> {
    let ix = cx
        .sim
        .module(m)
        .and_then(|module| module.find_port(label))
        .ok_or_else(|| format!("missing port {label:?}"))?;
    Ok(PortRef::new(m, ix))
}

fn main() -> Result<(), String> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp(None)
        .init();

    println!("4-bit counter demo");
    println!("register -> adder -> register, incremented by a constant one");
    println!();

    let shared = SimContext::shared();
    let mut cx = shared.lock().map_err(|_| "context poisoned".to_string())?;

    let clock = cx.add_module(ModuleKind::Clock, Vec2::new(0.0, 100.0));
    let one = cx.add_module(ModuleKind::SwitchInput, Vec2::new(0.0, 0.0));
    let add = cx.add_module(ModuleKind::AddSub, Vec2::new(100.0, 0.0));
    let reg = cx.add_module(ModuleKind::Register, Vec2::new(200.0, 0.0));
    cx.set_switch(one, 0, true);

    let wires = [
        (port(&cx, one, "Output")?, port(&cx, add, "Input B")?),
        (port(&cx, add, "Output")?, port(&cx, reg, "Input")?),
        (port(&cx, reg, "Output")?, port(&cx, add, "Input A")?),
        (port(&cx, clock, "Clock out")?, port(&cx, reg, "Clock in")?),
    ];
    for (from, to) in wires {
        cx.create_link(from, to, WirePath::new())
            .map_err(|e| e.to_string())?;
    }
    let reg_out = port(&cx, reg, "Output")?;
    drop(cx);

    println!("ten hand-driven clock cycles:");
    for cycle in 1..=10 {
        let mut cx = shared.lock().map_err(|_| "context poisoned".to_string())?;
        cx.tick(); // rising edge latches
        cx.tick(); // falling edge completes the cycle
        let word = cx.sim.port(reg_out).map(|p| p.value).unwrap_or_default();
        println!("  cycle {cycle:2}: register = {word}");
    }
    println!();

    println!("free-running for two seconds at four cycles per second:");
    let mut ticker = Ticker::start(Arc::clone(&shared), Duration::from_millis(125));
    thread::sleep(Duration::from_secs(2));
    ticker.stop();

    let cx = shared.lock().map_err(|_| "context poisoned".to_string())?;
    let word = cx.sim.port(reg_out).map(|p| p.value).unwrap_or_default();
    println!("  register now reads {word}");
    Ok(())
}
