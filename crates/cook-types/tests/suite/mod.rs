mod custom_hierarchy;
mod minimal_jdk_subtyping;
