//! Job templates and artifact naming shared by several generators.

use crate::facts::EnvironmentFacts;
use crate::pipeline::{Executor, Job, Step};
use crate::version::VersionInfo;

pub const BUILD_BACKEND: &str = "build-backend";
pub const BUILD_CONSOLE: &str = "build-console";
pub const BUILD_PORTAL: &str = "build-portal";
pub const PACKAGE_BUNDLE: &str = "package-bundle";
pub const BUILD_RPM: &str = "build-rpm";
pub const PUBLISH_RPM: &str = "publish-rpm";
pub const DOCKER_IMAGES: &str = "docker-images";

const MAVEN: &str = "mvn -s .gravitee.settings.xml -B -U";

/// Deliverable components of the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Gateway,
    ManagementApi,
    Console,
    Portal,
}

impl Component {
    pub const ALL: [Component; 4] = [
        Component::Gateway,
        Component::ManagementApi,
        Component::Console,
        Component::Portal,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Component::Gateway => "gateway",
            Component::ManagementApi => "management API",
            Component::Console => "console",
            Component::Portal => "portal",
        }
    }

    pub fn image(&self) -> &'static str {
        match self {
            Component::Gateway => "graviteeio/apim-gateway",
            Component::ManagementApi => "graviteeio/apim-management-api",
            Component::Console => "graviteeio/apim-management-ui",
            Component::Portal => "graviteeio/apim-portal-ui",
        }
    }

    pub fn dockerfile(&self) -> &'static str {
        match self {
            Component::Gateway => "gravitee-apim-gateway/docker/Dockerfile",
            Component::ManagementApi => "gravitee-apim-rest-api/docker/Dockerfile",
            Component::Console => "gravitee-apim-console-webui/docker/Dockerfile",
            Component::Portal => "gravitee-apim-portal-webui-next/docker/Dockerfile",
        }
    }

    fn rpm_name(&self) -> &'static str {
        match self {
            Component::Gateway => "graviteeio-apim-gateway",
            Component::ManagementApi => "graviteeio-apim-rest-api",
            Component::Console => "graviteeio-apim-management-ui",
            Component::Portal => "graviteeio-apim-portal-ui",
        }
    }
}

/// Directory holding artifacts of this build.
pub fn artifact_dir(facts: &EnvironmentFacts) -> String {
    if facts.build_id.is_empty() {
        "dist".to_string()
    } else {
        format!("dist/{}", facts.build_id)
    }
}

pub fn bundle_file(version: &VersionInfo) -> String {
    format!("gravitee-apim-full-{version}.zip")
}

pub fn rpm_file(component: Component, version: &VersionInfo) -> String {
    format!(
        "{}-{}x-{version}.noarch.rpm",
        component.rpm_name(),
        version.major
    )
}

/// Package-cloud repository receiving RPMs for this version class.
pub fn rpm_repository(version: &VersionInfo) -> &'static str {
    if version.is_prerelease() {
        "graviteeio/rpms-unstable"
    } else {
        "graviteeio/rpms"
    }
}

/// Stamp a job with the version and build it belongs to.
pub fn traced(job: Job, facts: &EnvironmentFacts, version: &VersionInfo) -> Job {
    job.param("apim_version", version.to_string())
        .param("build_id", facts.build_id.as_str())
}

pub fn build_backend() -> Job {
    Job::new(BUILD_BACKEND, Executor::OpenJdk).step(Step::build(
        "Build APIM backend",
        format!("{MAVEN} clean install -DskipTests -Dskip.validation=true -T 2C"),
    ))
}

pub fn build_console() -> Job {
    Job::new(BUILD_CONSOLE, Executor::Node)
        .step(Step::build(
            "Install console dependencies",
            "yarn --cwd gravitee-apim-console-webui install --immutable",
        ))
        .step(Step::build(
            "Build console",
            "yarn --cwd gravitee-apim-console-webui build:prod",
        ))
}

pub fn build_portal() -> Job {
    Job::new(BUILD_PORTAL, Executor::Node)
        .step(Step::build(
            "Install portal dependencies",
            "yarn --cwd gravitee-apim-portal-webui-next install --immutable",
        ))
        .step(Step::build(
            "Build portal",
            "yarn --cwd gravitee-apim-portal-webui-next build",
        ))
}

/// Build the distribution and name the full bundle after the version.
pub fn package_bundle(facts: &EnvironmentFacts, version: &VersionInfo) -> Job {
    let dir = artifact_dir(facts);
    Job::new(PACKAGE_BUNDLE, Executor::OpenJdk)
        .step(Step::build(
            "Build APIM distribution",
            format!("{MAVEN} -P bundle-default clean install -DskipTests -Dskip.validation=true -T 2C"),
        ))
        .step(Step::package(
            "Name distribution bundle",
            format!(
                "mkdir -p {dir} && cp gravitee-apim-distribution/target/gravitee-apim-distribution-*.zip {dir}/{}",
                bundle_file(version)
            ),
        ))
}

/// One RPM per component, built from the named bundle.
pub fn build_rpm(facts: &EnvironmentFacts, version: &VersionInfo) -> Job {
    let dir = artifact_dir(facts);
    let bundle = bundle_file(version);
    let mut job = Job::new(BUILD_RPM, Executor::Machine).requires(PACKAGE_BUNDLE);
    for component in Component::ALL {
        job = job.step(Step::package(
            format!("Build {} RPM", component.label()),
            format!(
                "./scripts/build-rpm.sh --version {version} --source {dir}/{bundle} --output {dir}/{}",
                rpm_file(component, version)
            ),
        ));
    }
    job.step(Step::verify("Verify RPM signatures", format!("rpm -K {dir}/*.rpm")))
}

pub fn publish_rpm(facts: &EnvironmentFacts, version: &VersionInfo) -> Job {
    let dir = artifact_dir(facts);
    Job::new(PUBLISH_RPM, Executor::Base)
        .requires(BUILD_RPM)
        .step(Step::publish(
            "Publish RPMs",
            format!(
                "package_cloud push {}/el/7 {dir}/*.rpm",
                rpm_repository(version)
            ),
        ))
}

/// Build every component image with `primary_tag`, add `extra_tags`, push.
pub fn docker_images(primary_tag: &str, extra_tags: &[String]) -> Job {
    let mut job = Job::new(DOCKER_IMAGES, Executor::Machine);
    for component in Component::ALL {
        let image = component.image();
        job = job.step(Step::build(
            format!("Build {} image", component.label()),
            format!(
                "docker build -f {} -t {image}:{primary_tag} .",
                component.dockerfile()
            ),
        ));
    }
    for component in Component::ALL {
        let image = component.image();
        for tag in extra_tags {
            job = job.step(Step::tag(
                format!("Tag {} image as {tag}", component.label()),
                format!("docker tag {image}:{primary_tag} {image}:{tag}"),
            ));
        }
        job = job.step(Step::publish(
            format!("Push {} image", component.label()),
            format!("docker push --all-tags {image}"),
        ));
    }
    job
}
