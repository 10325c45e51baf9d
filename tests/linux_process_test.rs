use std::fs::{self, File};
use std::os::unix::fs::FileExt;
use std::path::Path;

use proc_disasm::capstone::Disassembler;
use proc_disasm::{build_region_map, disassemble, Arch, DisasmError, LinuxProcess, Process};

const PID: u32 = 4242;

const MAPS: &str = "\
00001000-00002000 r-xp 00000000 08:02 11 /opt/fake/bin/app
00005000-00006000 r--p 00004000 08:02 11 /opt/fake/bin/app
00010000-00011000 rw-p 00000000 00:00 0  [heap]
";

fn fake_proc(root: &Path) {
    let dir = root.join(PID.to_string());
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("maps"), MAPS).unwrap();

    let mem = File::create(dir.join("mem")).unwrap();
    mem.set_len(0x20000).unwrap();
    mem.write_all_at(b"from proc\0", 0x5000).unwrap();
    mem.write_all_at(&0x5000u64.to_le_bytes(), 0x5100).unwrap();
}

#[test]
fn reads_maps_and_memory_from_proc_root() {
    let root = tempfile::tempdir().unwrap();
    fake_proc(root.path());

    let process = LinuxProcess::with_proc_root(root.path(), PID).unwrap();
    assert_eq!(process.pid(), PID);
    assert_eq!(process.maps().unwrap().len(), 3);

    let range = process.find_range(0x1800).unwrap();
    assert_eq!((range.base, range.end()), (0x1000, 0x2000));
    assert!(range.protection.execute);
    assert!(process.find_range(0x3000).is_none());

    let modules = process.modules();
    assert_eq!(modules.len(), 1);
    assert_eq!(modules[0].name, "app");
    assert_eq!(modules[0].base, 0x1000);
    // The module file does not exist, so there is nothing to enumerate.
    assert!(process.sections(&modules[0]).is_empty());
    assert!(build_region_map(&process).is_empty());

    assert_eq!(process.read_c_string(0x5000).unwrap(), "from proc");
    assert_eq!(process.read_bytes(0x5000, 4).unwrap(), b"from");
    assert!(process.read_bytes(0x30000, 4).is_err());
}

#[test]
fn unknown_architecture_is_rejected() {
    let root = tempfile::tempdir().unwrap();
    fake_proc(root.path());
    let process = LinuxProcess::with_proc_root(root.path(), PID).unwrap();
    assert!(!process.arch().is_supported());

    let decoder = Disassembler::new(&process).unwrap();
    let err = disassemble(&process, &decoder, &process, 0x1000, 10).unwrap_err();
    assert!(matches!(err, DisasmError::ArchitectureUnsupported(_)));
}

#[test]
fn missing_process_fails_to_attach() {
    let root = tempfile::tempdir().unwrap();
    assert!(LinuxProcess::with_proc_root(root.path(), PID).is_err());
}

#[cfg(target_os = "linux")]
#[test]
fn attaches_to_self() {
    let process = LinuxProcess::attach(std::process::id()).unwrap();
    let expected = if cfg!(target_arch = "aarch64") {
        Arch::Arm64
    } else if cfg!(target_arch = "x86_64") {
        Arch::X64
    } else {
        process.arch()
    };
    assert_eq!(process.arch(), expected);

    let here = attaches_to_self as fn() as usize as u64;
    let range = process.find_range(here).unwrap();
    assert!(range.protection.execute);
    assert!(!process.modules().is_empty());
    assert!(build_region_map(&process)
        .iter()
        .any(|r| r.name.as_deref() == Some(".text")));
}

#[cfg(all(target_os = "linux", target_arch = "x86_64"))]
#[test]
fn self_on_x86_64_is_unsupported() {
    let process = LinuxProcess::attach(std::process::id()).unwrap();
    let decoder = Disassembler::new(&process).unwrap();
    let here = self_on_x86_64_is_unsupported as fn() as usize as u64;
    assert_eq!(
        disassemble(&process, &decoder, &process, here, 10).unwrap_err(),
        DisasmError::ArchitectureUnsupported(Arch::X64)
    );
}

#[cfg(all(target_os = "linux", target_arch = "aarch64"))]
#[test]
fn disassembles_own_code_on_arm64() {
    let process = LinuxProcess::attach(std::process::id()).unwrap();
    let decoder = Disassembler::new(&process).unwrap();
    let here = disassembles_own_code_on_arm64 as fn() as usize as u64;
    let records = disassemble(&process, &decoder, &process, here, 8).unwrap();
    assert!(!records.is_empty());
    assert!(records.len() <= 8);
    assert_eq!(records[0].address, here);
}
