//! Catalog shipped with the binary.

use std::collections::BTreeMap;

use super::{Catalog, CatalogEntry, Tier};
use crate::release::{ManualTool, PackagingKind};

fn tier(name: &str, description: &str, extends: &[&str], entries: &[(&str, &str)]) -> Tier {
    Tier {
        name: name.to_string(),
        description: description.to_string(),
        extends: extends.iter().map(|s| s.to_string()).collect(),
        entries: entries
            .iter()
            .map(|(name, package)| CatalogEntry::new(*name, *package))
            .collect(),
    }
}

fn arch_map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Same token for every supported architecture; used by install scripts
/// that detect the platform themselves.
fn any_arch() -> BTreeMap<String, String> {
    arch_map(&[
        ("x86_64", "x86_64"),
        ("aarch64", "aarch64"),
        ("armv7", "armv7"),
    ])
}

fn github_tarball(
    name: &str,
    description: &str,
    repo: &str,
    version: &str,
    file: &str,
    arches: &[(&str, &str)],
    asset_pattern: &str,
) -> ManualTool {
    ManualTool {
        name: name.to_string(),
        description: description.to_string(),
        repo: Some(repo.to_string()),
        pinned_version: version.to_string(),
        url_pattern: format!("https://github.com/{}/releases/download/v{{version}}/{}", repo, file),
        arch_map: arch_map(arches),
        packaging: PackagingKind::Tarball,
        asset_pattern: Some(asset_pattern.to_string()),
        binary: name.to_string(),
        command: None,
        script_args: vec![],
        system_link: false,
    }
}

fn install_script(name: &str, description: &str, url: &str, args: &[&str]) -> ManualTool {
    ManualTool {
        name: name.to_string(),
        description: description.to_string(),
        repo: None,
        pinned_version: "latest".to_string(),
        url_pattern: url.to_string(),
        arch_map: any_arch(),
        packaging: PackagingKind::InstallerScript,
        asset_pattern: None,
        binary: name.to_string(),
        command: None,
        script_args: args.iter().map(|s| s.to_string()).collect(),
        system_link: false,
    }
}

fn manual_tools() -> Vec<ManualTool> {
    let lazygit = github_tarball(
        "lazygit",
        "Terminal UI for git",
        "jesseduffield/lazygit",
        "0.44.1",
        "lazygit_{version}_Linux_{arch}.tar.gz",
        &[("x86_64", "x86_64"), ("aarch64", "arm64"), ("armv7", "armv6")],
        r"_Linux_{arch}\.tar\.gz$",
    );

    let mut lazydocker = github_tarball(
        "lazydocker",
        "Terminal UI for docker",
        "jesseduffield/lazydocker",
        "0.23.3",
        "lazydocker_{version}_Linux_{arch}.tar.gz",
        &[("x86_64", "x86_64"), ("aarch64", "arm64"), ("armv7", "armv7")],
        r"_Linux_{arch}\.tar\.gz$",
    );
    // Used from root shells inside containers too.
    lazydocker.system_link = true;

    let eza = github_tarball(
        "eza",
        "Modern replacement for ls",
        "eza-community/eza",
        "0.20.4",
        "eza_{arch}-unknown-linux-gnu.tar.gz",
        &[("x86_64", "x86_64"), ("aarch64", "aarch64")],
        r"^eza_{arch}-unknown-linux-gnu\.tar\.gz$",
    );

    let yq = ManualTool {
        name: "yq".to_string(),
        description: "YAML processor".to_string(),
        repo: Some("mikefarah/yq".to_string()),
        pinned_version: "4.44.3".to_string(),
        url_pattern: "https://github.com/mikefarah/yq/releases/download/v{version}/yq_linux_{arch}"
            .to_string(),
        arch_map: arch_map(&[("x86_64", "amd64"), ("aarch64", "arm64"), ("armv7", "arm")]),
        packaging: PackagingKind::RawBinary,
        asset_pattern: Some(r"^yq_linux_{arch}$".to_string()),
        binary: "yq".to_string(),
        command: None,
        script_args: vec![],
        system_link: false,
    };

    let tealdeer = ManualTool {
        name: "tealdeer".to_string(),
        description: "Fast tldr client".to_string(),
        repo: Some("dbrgn/tealdeer".to_string()),
        pinned_version: "1.7.1".to_string(),
        url_pattern:
            "https://github.com/dbrgn/tealdeer/releases/download/v{version}/tealdeer-linux-{arch}-musl"
                .to_string(),
        arch_map: arch_map(&[("x86_64", "x86_64"), ("aarch64", "aarch64")]),
        packaging: PackagingKind::RawBinary,
        asset_pattern: Some(r"^tealdeer-linux-{arch}-musl$".to_string()),
        binary: "tealdeer".to_string(),
        command: Some("tldr".to_string()),
        script_args: vec![],
        system_link: false,
    };

    let starship = install_script(
        "starship",
        "Cross-shell prompt",
        "https://starship.rs/install.sh",
        &["-y", "-b", "{bin_dir}"],
    );

    let zoxide = install_script(
        "zoxide",
        "Smarter cd",
        "https://raw.githubusercontent.com/ajeetdsouza/zoxide/main/install.sh",
        &["--bin-dir", "{bin_dir}"],
    );

    vec![lazygit, lazydocker, eza, yq, tealdeer, starship, zoxide]
}

/// Built-in tiers: minimal -> standard -> developer -> full.
///
/// Debian ships a few tools under other executable names (`batcat`,
/// `fdfind`); those entries name the executable apt really installs and the
/// reconciler adds the familiar name afterwards.
pub fn builtin_catalog() -> Catalog {
    let tiers = vec![
        tier(
            "minimal",
            "Bare essentials for a fresh machine",
            &[],
            &[
                ("git", "git"),
                ("curl", "curl"),
                ("wget", "wget"),
                ("unzip", "unzip"),
            ],
        ),
        tier(
            "standard",
            "Everyday terminal tools",
            &["minimal"],
            &[
                ("vim", "vim"),
                ("htop", "htop"),
                ("tmux", "tmux"),
                ("tree", "tree"),
                ("jq", "jq"),
                ("rg", "ripgrep"),
                ("batcat", "bat"),
                ("fdfind", "fd-find"),
                ("fzf", "fzf"),
            ],
        ),
        tier(
            "developer",
            "Compilers, containers and project tooling",
            &["standard"],
            &[
                ("gcc", "build-essential"),
                ("make", "make"),
                ("python3", "python3"),
                ("pip3", "python3-pip"),
                ("shellcheck", "shellcheck"),
                ("docker", "docker.io"),
                ("gh", "gh"),
                ("direnv", "direnv"),
            ],
        ),
        tier(
            "full",
            "Everything, plus network and media utilities",
            &["developer"],
            &[
                ("ncdu", "ncdu"),
                ("btop", "btop"),
                ("nmap", "nmap"),
                ("mtr", "mtr-tiny"),
                ("http", "httpie"),
                ("ffmpeg", "ffmpeg"),
            ],
        ),
    ];

    Catalog {
        tiers,
        manual_tools: manual_tools(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_builtin_catalog_is_valid() {
        builtin_catalog().validate().unwrap();
    }

    #[test]
    fn test_developer_contains_standard_without_duplicates() {
        let catalog = builtin_catalog();
        let standard = catalog.resolve("standard").unwrap();
        let developer = catalog.resolve("developer").unwrap();

        let names: Vec<_> = developer.iter().map(|e| e.logical_name.as_str()).collect();
        let unique: HashSet<_> = names.iter().collect();
        assert_eq!(names.len(), unique.len());

        assert_eq!(&developer[..standard.len()], &standard[..]);
        assert!(names.contains(&"docker"));
        assert!(names.contains(&"git"));
    }

    #[test]
    fn test_every_manual_tool_has_a_pinned_url_for_its_arches() {
        for tool in builtin_catalog().manual_tools {
            assert!(!tool.arch_map.is_empty(), "{} declares no arch", tool.name);
            for arch in tool.arch_map.keys() {
                let url = tool.pinned_url(arch).unwrap();
                assert!(url.starts_with("https://"), "{}", url);
                assert!(!url.contains('{'), "unsubstituted template in {}", url);
            }
        }
    }

    #[test]
    fn test_tealdeer_is_invoked_as_tldr() {
        let catalog = builtin_catalog();
        let tool = catalog.manual_tool("tealdeer").unwrap();
        assert_eq!(tool.command_name(), "tldr");
        assert_eq!(tool.binary, "tealdeer");
    }
}
